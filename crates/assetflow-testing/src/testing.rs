use crate::asset::DiscoveredImageAsset;
use crate::discovery::discover_image_assets;
use crate::error::Result;
use crate::orchestrator::{BuildConcurrency, build_image_asset, build_image_assets};
use assetflow_build::{DockerCli, ImageBuilder};
use std::path::{Path, PathBuf};

/// cloud assembly のイメージアセットをテスト用にビルドする
///
/// 作成時にアセットを発見し、以降は発見済みの一覧に対して何度でもビルドできる。
///
/// ```no_run
/// use assetflow_testing::{ImageAssetTesting, ImageBuilder};
///
/// # async fn run() -> assetflow_testing::Result<()> {
/// let image_assets = ImageAssetTesting::new("cdk.out/assembly-dev")?;
/// let tags = image_assets.build_all(Some("test")).await?;
///
/// for tag in &tags {
///     assert!(image_assets.docker().exists(tag).await.unwrap());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImageAssetTesting<B = DockerCli> {
    assembly_directory: PathBuf,
    image_assets: Vec<DiscoveredImageAsset>,
    docker: B,
}

impl ImageAssetTesting<DockerCli> {
    /// docker CLI (`CDK_DOCKER` で差し替え可) を使って作成
    pub fn new(assembly_directory: impl AsRef<Path>) -> Result<Self> {
        Self::with_builder(assembly_directory, DockerCli::from_env())
    }
}

impl<B: ImageBuilder> ImageAssetTesting<B> {
    /// 任意のビルダーを使って作成
    pub fn with_builder(assembly_directory: impl AsRef<Path>, docker: B) -> Result<Self> {
        let assembly_directory = assembly_directory.as_ref().to_path_buf();
        let image_assets = discover_image_assets(&assembly_directory)?;

        Ok(Self {
            assembly_directory,
            image_assets,
            docker,
        })
    }

    pub fn assembly_directory(&self) -> &Path {
        &self.assembly_directory
    }

    /// 発見済みのイメージアセット（発見順）
    pub fn image_assets(&self) -> &[DiscoveredImageAsset] {
        &self.image_assets
    }

    /// ビルダーのハンドル（イメージの存在確認などに使う）
    pub fn docker(&self) -> &B {
        &self.docker
    }

    /// 1つのアセットだけをビルド
    pub async fn build(
        &self,
        asset: &DiscoveredImageAsset,
        target_override: Option<&str>,
    ) -> Result<String> {
        build_image_asset(&self.docker, asset, target_override).await
    }

    /// すべてのアセットを同時にビルドしてタグを発見順に返す
    pub async fn build_all(&self, target_override: Option<&str>) -> Result<Vec<String>> {
        self.build_all_with(target_override, BuildConcurrency::Unbounded)
            .await
    }

    /// 同時実行数を指定してすべてのアセットをビルド
    pub async fn build_all_with(
        &self,
        target_override: Option<&str>,
        concurrency: BuildConcurrency,
    ) -> Result<Vec<String>> {
        build_image_assets(&self.docker, &self.image_assets, target_override, concurrency).await
    }
}
