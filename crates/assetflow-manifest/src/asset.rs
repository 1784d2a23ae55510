//! Asset マニフェスト (*.assets.json)
//!
//! ファイルアセットとコンテナイメージアセットを、送り先 (destination) ごとの
//! エントリとして列挙する。マニフェスト内の相対パスはすべてマニフェスト
//! ファイルのあるディレクトリを基準に解決する。

use crate::error::Result;
use crate::loader::read_json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// ディレクトリが渡されたときに読むファイル名
pub const DEFAULT_ASSET_MANIFEST_FILE: &str = "assets.json";

/// キャッシュのインポート/エクスポート指定 (`--cache-from` / `--cache-to`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerCacheOption {
    #[serde(rename = "type")]
    pub cache_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

/// コンテナイメージのビルド元
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImageSource {
    /// ビルドコンテキスト（マニフェストのディレクトリからの相対パス）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// ビルドの代わりにイメージ名を出力するコマンド
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_build_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_build_args: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_build_secrets: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_outputs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_from: Option<Vec<DockerCacheOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_to: Option<DockerCacheOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImageDestination {
    pub repository_name: String,
    pub image_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDestination {
    pub bucket_name: String,
    pub object_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role_arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerImageAsset {
    pub source: DockerImageSource,
    #[serde(default)]
    pub destinations: IndexMap<String, DockerImageDestination>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAsset {
    pub source: FileSource,
    #[serde(default)]
    pub destinations: IndexMap<String, FileDestination>,
}

/// ファイル上の asset manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifestFile {
    pub version: String,
    #[serde(default)]
    pub files: IndexMap<String, FileAsset>,
    #[serde(default)]
    pub docker_images: IndexMap<String, DockerImageAsset>,
}

/// アセットと送り先の組
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationIdentifier {
    pub asset_id: String,
    pub destination_id: String,
}

impl DestinationIdentifier {
    pub fn new(asset_id: impl Into<String>, destination_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            destination_id: destination_id.into(),
        }
    }
}

impl fmt::Display for DestinationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.destination_id.is_empty() {
            write!(f, "{}", self.asset_id)
        } else {
            write!(f, "{}:{}", self.asset_id, self.destination_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileManifestEntry {
    pub id: DestinationIdentifier,
    pub source: FileSource,
    pub destination: FileDestination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerImageManifestEntry {
    pub id: DestinationIdentifier,
    pub source: DockerImageSource,
    pub destination: DockerImageDestination,
}

/// asset manifest の1エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetManifestEntry {
    File(FileManifestEntry),
    DockerImage(DockerImageManifestEntry),
}

impl AssetManifestEntry {
    /// エントリ種別 (`"file"` / `"docker-image"`)
    pub fn kind(&self) -> &'static str {
        match self {
            AssetManifestEntry::File(_) => "file",
            AssetManifestEntry::DockerImage(_) => "docker-image",
        }
    }

    pub fn id(&self) -> &DestinationIdentifier {
        match self {
            AssetManifestEntry::File(entry) => &entry.id,
            AssetManifestEntry::DockerImage(entry) => &entry.id,
        }
    }
}

/// 読み込み済みの asset manifest
#[derive(Debug, Clone)]
pub struct AssetManifest {
    directory: PathBuf,
    manifest: AssetManifestFile,
}

impl AssetManifest {
    /// パスから asset manifest を読み込む
    ///
    /// ディレクトリが渡された場合はその中の `assets.json` を読む。
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(DEFAULT_ASSET_MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };

        let manifest: AssetManifestFile = read_json(&file)?;
        let directory = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        info!(
            directory = %directory.display(),
            files = manifest.files.len(),
            docker_images = manifest.docker_images.len(),
            "Loaded asset manifest"
        );

        Ok(Self::new(directory, manifest))
    }

    pub fn new(directory: PathBuf, manifest: AssetManifestFile) -> Self {
        Self {
            directory,
            manifest,
        }
    }

    /// マニフェストファイルのあるディレクトリ
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn manifest(&self) -> &AssetManifestFile {
        &self.manifest
    }

    /// (アセット, 送り先) ごとのエントリ
    ///
    /// ファイルアセット、コンテナイメージの順。それぞれマニフェストの記述順。
    pub fn entries(&self) -> Vec<AssetManifestEntry> {
        let files = self.manifest.files.iter().flat_map(|(asset_id, asset)| {
            asset.destinations.iter().map(move |(destination_id, destination)| {
                AssetManifestEntry::File(FileManifestEntry {
                    id: DestinationIdentifier::new(asset_id, destination_id),
                    source: asset.source.clone(),
                    destination: destination.clone(),
                })
            })
        });

        let images = self
            .manifest
            .docker_images
            .iter()
            .flat_map(|(asset_id, asset)| {
                asset.destinations.iter().map(move |(destination_id, destination)| {
                    AssetManifestEntry::DockerImage(DockerImageManifestEntry {
                        id: DestinationIdentifier::new(asset_id, destination_id),
                        source: asset.source.clone(),
                        destination: destination.clone(),
                    })
                })
            });

        files.chain(images).collect()
    }
}
