use assetflow_manifest::DockerCacheOption;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 1回のイメージビルドの要求
///
/// `directory` は解決済みのビルドコンテキスト。`file` はそこからの相対パス。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub directory: PathBuf,
    pub tag: String,
    pub build_args: BTreeMap<String, String>,
    pub build_secrets: BTreeMap<String, String>,
    pub target: Option<String>,
    pub file: Option<String>,
    pub network_mode: Option<String>,
    pub platform: Option<String>,
    pub outputs: Vec<String>,
    pub cache_from: Vec<DockerCacheOption>,
    pub cache_to: Option<DockerCacheOption>,
    pub cache_disabled: bool,
}

impl BuildOptions {
    pub fn new(directory: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }
}
