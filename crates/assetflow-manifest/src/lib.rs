//! AssetFlow manifest models
//!
//! cloud assembly の manifest.json と、そこから参照される asset manifest を
//! 型付きで読み込みます。

pub mod assembly;
pub mod asset;
pub mod error;
mod loader;

pub use assembly::{
    ASSEMBLY_MANIFEST_FILE, ArtifactManifest, ArtifactType, AssemblyManifest,
    AssetManifestProperties,
};
pub use asset::{
    AssetManifest, AssetManifestEntry, AssetManifestFile, DEFAULT_ASSET_MANIFEST_FILE,
    DestinationIdentifier, DockerCacheOption, DockerImageAsset, DockerImageDestination,
    DockerImageManifestEntry, DockerImageSource, FileAsset, FileDestination, FileManifestEntry,
    FileSource,
};
pub use error::{ManifestError, Result};
