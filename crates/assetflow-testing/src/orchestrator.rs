//! ビルドのオーケストレーション
//!
//! 発見済みアセットとビルダーを引数で受け取るだけで、状態は持たない。

use crate::asset::DiscoveredImageAsset;
use crate::error::{Result, TestingError};
use assetflow_build::ImageBuilder;
use futures_util::future::try_join_all;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::num::NonZeroUsize;
use tracing::{debug, info};

/// 同時に走らせるビルドの数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildConcurrency {
    /// すべてのビルドを一度に投入する
    #[default]
    Unbounded,
    /// 同時実行数を制限する（結果の順序は変わらない）
    Limited(NonZeroUsize),
}

/// 1つのイメージアセットをビルドしてタグを返す
///
/// 返すタグとビルダーに渡すタグは同じ値。
pub async fn build_image_asset<B>(
    builder: &B,
    asset: &DiscoveredImageAsset,
    target_override: Option<&str>,
) -> Result<String>
where
    B: ImageBuilder + ?Sized,
{
    let options = asset.build_options(target_override)?;
    debug!(
        asset_id = %asset.asset_id(),
        tag = %options.tag,
        builder = builder.name(),
        "Submitting image build"
    );

    builder
        .build(&options)
        .await
        .map_err(|source| TestingError::Build {
            asset_id: asset.asset_id().to_string(),
            tag: options.tag.clone(),
            source,
        })?;

    Ok(options.tag)
}

/// すべてのイメージアセットをビルドしてタグを発見順に返す
///
/// どれか1つでも失敗したら最初のエラーを返す。残りのビルドの結果は待たない。
pub async fn build_image_assets<B>(
    builder: &B,
    assets: &[DiscoveredImageAsset],
    target_override: Option<&str>,
    concurrency: BuildConcurrency,
) -> Result<Vec<String>>
where
    B: ImageBuilder + ?Sized,
{
    info!(
        image_assets = assets.len(),
        target = target_override.unwrap_or("(default)"),
        ?concurrency,
        "Building image assets"
    );

    let builds = assets
        .iter()
        .map(|asset| build_image_asset(builder, asset, target_override));

    let tags: Vec<String> = match concurrency {
        BuildConcurrency::Unbounded => try_join_all(builds).await?,
        BuildConcurrency::Limited(limit) => {
            stream::iter(builds)
                .buffered(limit.get())
                .try_collect()
                .await?
        }
    };

    info!(built = tags.len(), "All image assets built");
    Ok(tags)
}
