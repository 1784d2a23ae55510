use assetflow_build::BuildError;
use assetflow_manifest::ManifestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestingError {
    #[error("Failed to load cloud assembly: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to build image asset '{asset_id}' as {tag}: {source}")]
    Build {
        asset_id: String,
        tag: String,
        #[source]
        source: BuildError,
    },

    #[error("Image asset '{asset_id}' has no build directory (executable-sourced images cannot be built locally)")]
    NotBuildable { asset_id: String },
}

impl TestingError {
    /// 失敗したアセットのID
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            TestingError::Build { asset_id, .. } | TestingError::NotBuildable { asset_id } => {
                Some(asset_id)
            }
            TestingError::Manifest(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TestingError>;
