//! イメージアセットの発見
//!
//! manifest.json → asset manifest → docker-image エントリの順にたどる。

use crate::asset::DiscoveredImageAsset;
use crate::error::Result;
use assetflow_manifest::{AssemblyManifest, AssetManifest, AssetManifestEntry};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// assembly ディレクトリからイメージアセットを発見
///
/// 順序は artifact の記述順 × エントリの記述順。重複は除去しない。
/// 途中でマニフェストの読み込みに失敗した場合は全体が失敗する。
#[instrument(skip(assembly_dir), fields(assembly_dir = %assembly_dir.display()))]
pub fn discover_image_assets(assembly_dir: &Path) -> Result<Vec<DiscoveredImageAsset>> {
    let manifest = AssemblyManifest::load_from_directory(assembly_dir)?;

    let mut assets = Vec::new();
    for (artifact, file) in manifest.asset_manifest_files()? {
        debug!(artifact = %artifact, file = %file, "Loading asset manifest");
        let asset_manifest = AssetManifest::from_path(&assembly_dir.join(&file))?;

        for entry in asset_manifest.entries() {
            match entry {
                AssetManifestEntry::DockerImage(image) => {
                    assets.push(DiscoveredImageAsset::from_entry(
                        image,
                        asset_manifest.directory(),
                    ));
                }
                other => {
                    debug!(kind = other.kind(), id = %other.id(), "Skipping non-image entry");
                }
            }
        }
    }

    warn_duplicate_asset_ids(&assets);

    info!(image_assets = assets.len(), "Discovered image assets");
    Ok(assets)
}

/// 同じ assetId は同じタグになり、後からビルドされたものが残る
fn warn_duplicate_asset_ids(assets: &[DiscoveredImageAsset]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for asset in assets {
        *counts.entry(asset.asset_id()).or_default() += 1;
    }

    for (asset_id, count) in counts {
        if count > 1 {
            warn!(
                asset_id = %asset_id,
                count,
                "Image asset appears more than once; builds will share the same tag"
            );
        }
    }
}
