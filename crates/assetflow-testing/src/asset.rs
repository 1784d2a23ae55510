//! 発見されたイメージアセット
//!
//! asset manifest のエントリを、マニフェストのディレクトリ付きの
//! 自己完結したビルド仕様に正規化したもの。

use crate::error::{Result, TestingError};
use crate::tag::image_tag;
use assetflow_build::BuildOptions;
use assetflow_manifest::{
    DestinationIdentifier, DockerImageDestination, DockerImageManifestEntry, DockerImageSource,
};
use std::path::{Path, PathBuf};

/// ビルド対象のイメージアセット
///
/// 発見後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImageAsset {
    id: DestinationIdentifier,
    source: DockerImageSource,
    destination: DockerImageDestination,
    manifest_directory: PathBuf,
}

impl DiscoveredImageAsset {
    /// manifest のエントリと、そのマニフェストのディレクトリから作成
    pub fn from_entry(entry: DockerImageManifestEntry, manifest_directory: &Path) -> Self {
        let DockerImageManifestEntry {
            id,
            source,
            destination,
        } = entry;

        Self {
            id,
            source,
            destination,
            manifest_directory: manifest_directory.to_path_buf(),
        }
    }

    pub fn id(&self) -> &DestinationIdentifier {
        &self.id
    }

    pub fn asset_id(&self) -> &str {
        &self.id.asset_id
    }

    pub fn source(&self) -> &DockerImageSource {
        &self.source
    }

    pub fn destination(&self) -> &DockerImageDestination {
        &self.destination
    }

    /// asset manifest ファイルのあるディレクトリ
    pub fn manifest_directory(&self) -> &Path {
        &self.manifest_directory
    }

    /// 解決済みのビルドコンテキスト
    ///
    /// コマンドで生成するイメージ (`executable`) の場合は `None`。
    /// 存在確認はビルダーに任せる。
    pub fn context_directory(&self) -> Option<PathBuf> {
        self.source
            .directory
            .as_ref()
            .map(|dir| self.manifest_directory.join(dir))
    }

    /// マニフェストで宣言されたビルドターゲット（空文字列は未指定扱い）
    pub fn declared_target(&self) -> Option<&str> {
        self.source
            .docker_build_target
            .as_deref()
            .filter(|target| !target.is_empty())
    }

    /// 実際に使うビルドターゲット
    ///
    /// 優先順位:
    /// 1. 呼び出し側の指定
    /// 2. マニフェストの宣言
    ///
    /// 空文字列の指定はターゲットなしとして扱う。
    pub fn resolve_target<'a>(&'a self, target_override: Option<&'a str>) -> Option<&'a str> {
        target_override
            .or(self.declared_target())
            .filter(|target| !target.is_empty())
    }

    /// このアセットのローカルイメージタグ
    pub fn tag(&self, target_override: Option<&str>) -> String {
        image_tag(self.asset_id(), self.resolve_target(target_override))
    }

    /// ビルダーに渡すリクエストを組み立てる
    ///
    /// マニフェストの値はそのまま渡し、ターゲットだけ解決済みの値に置き換える。
    pub fn build_options(&self, target_override: Option<&str>) -> Result<BuildOptions> {
        let directory = self
            .context_directory()
            .ok_or_else(|| TestingError::NotBuildable {
                asset_id: self.asset_id().to_string(),
            })?;

        let source = &self.source;
        Ok(BuildOptions {
            directory,
            tag: self.tag(target_override),
            build_args: source.docker_build_args.clone().unwrap_or_default(),
            build_secrets: source.docker_build_secrets.clone().unwrap_or_default(),
            target: self.resolve_target(target_override).map(str::to_string),
            file: source.docker_file.clone(),
            network_mode: source.network_mode.clone(),
            platform: source.platform.clone(),
            outputs: source.docker_outputs.clone().unwrap_or_default(),
            cache_from: source.cache_from.clone().unwrap_or_default(),
            cache_to: source.cache_to.clone(),
            cache_disabled: source.cache_disabled.unwrap_or(false),
        })
    }
}
