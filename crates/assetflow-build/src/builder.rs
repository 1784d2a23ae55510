//! Image builder trait definition

use crate::error::BuildResult;
use crate::options::BuildOptions;
use async_trait::async_trait;

/// コンテナイメージビルダーの抽象
///
/// 1つのハンドルが複数の並行ビルドから共有されるため、`&self` だけで
/// 同時に呼び出せる必要がある。
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Returns the builder name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Build an image and leave it in the local image store under `options.tag`
    async fn build(&self, options: &BuildOptions) -> BuildResult<()>;

    /// Check whether an image with the given tag exists locally
    async fn exists(&self, tag: &str) -> BuildResult<bool>;
}
