//! マニフェストファイルの読み込み
//!
//! assembly manifest と asset manifest はどちらも JSON なので、
//! 読み込みとパースはここに集約する。

use crate::error::{ManifestError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// JSONファイルを読み込んで型付きで返す
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Reading manifest file");

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
