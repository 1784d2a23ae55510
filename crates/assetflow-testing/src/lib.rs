//! AssetFlow image asset testing
//!
//! cloud assembly (cdk.out) からコンテナイメージアセットを発見し、
//! テスト用のタグでローカルにビルドします。
//!
//! タグは `cdkasset-<assetId>[-<target>]` で、ビルド後はそのタグで
//! コンテナを起動してテストできます。

pub mod asset;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod tag;
mod testing;

pub use asset::DiscoveredImageAsset;
pub use discovery::discover_image_assets;
pub use error::{Result, TestingError};
pub use orchestrator::{BuildConcurrency, build_image_asset, build_image_assets};
pub use tag::{TAG_PREFIX, image_tag};
pub use testing::ImageAssetTesting;

pub use assetflow_build::{BuildOptions, DockerCli, EngineBuilder, ImageBuilder};
