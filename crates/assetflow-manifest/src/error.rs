use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {path}\nReason: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest: {path}\nReason: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid properties on asset manifest artifact '{artifact}': {message}")]
    InvalidArtifact { artifact: String, message: String },
}

impl ManifestError {
    /// 失敗したマニフェストファイルのパス
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ManifestError::Read { path, .. } | ManifestError::Parse { path, .. } => Some(path),
            ManifestError::InvalidArtifact { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;
