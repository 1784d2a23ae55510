//! Cloud assembly マニフェスト (manifest.json)
//!
//! デプロイ単位の成果物 (artifact) を列挙するトップレベルのマニフェスト。

use crate::error::{ManifestError, Result};
use crate::loader::read_json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument};

/// assembly ディレクトリ内のマニフェストファイル名
pub const ASSEMBLY_MANIFEST_FILE: &str = "manifest.json";

/// Artifact の種類
///
/// 未知の種類は `Other` として保持し、パースエラーにはしない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactType {
    None,
    CloudFormationStack,
    AssetManifest,
    Tree,
    NestedCloudAssembly,
    FeatureFlagReport,
    Other(String),
}

impl ArtifactType {
    pub fn as_str(&self) -> &str {
        match self {
            ArtifactType::None => "none",
            ArtifactType::CloudFormationStack => "aws:cloudformation:stack",
            ArtifactType::AssetManifest => "cdk:asset-manifest",
            ArtifactType::Tree => "cdk:tree",
            ArtifactType::NestedCloudAssembly => "cdk:cloud-assembly",
            ArtifactType::FeatureFlagReport => "cdk:feature-flag-report",
            ArtifactType::Other(s) => s,
        }
    }
}

impl From<String> for ArtifactType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "none" => ArtifactType::None,
            "aws:cloudformation:stack" => ArtifactType::CloudFormationStack,
            "cdk:asset-manifest" => ArtifactType::AssetManifest,
            "cdk:tree" => ArtifactType::Tree,
            "cdk:cloud-assembly" => ArtifactType::NestedCloudAssembly,
            "cdk:feature-flag-report" => ArtifactType::FeatureFlagReport,
            _ => ArtifactType::Other(value),
        }
    }
}

impl From<ArtifactType> for String {
    fn from(value: ArtifactType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// asset manifest artifact のプロパティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifestProperties {
    /// assembly ディレクトリからの相対パス
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_bootstrap_stack_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_stack_version_ssm_parameter: Option<String>,
}

/// 1つの artifact の記述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// 種類ごとに形が異なるため生のまま保持する
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ArtifactManifest {
    pub fn is_asset_manifest(&self) -> bool {
        self.artifact_type == ArtifactType::AssetManifest
    }

    /// asset manifest artifact のプロパティをデコード
    ///
    /// asset manifest 以外の artifact では `None`。
    pub fn asset_manifest_properties(
        &self,
        name: &str,
    ) -> Option<Result<AssetManifestProperties>> {
        if !self.is_asset_manifest() {
            return None;
        }

        let Some(properties) = &self.properties else {
            return Some(Err(ManifestError::InvalidArtifact {
                artifact: name.to_string(),
                message: "missing properties".to_string(),
            }));
        };

        Some(
            serde_json::from_value(properties.clone()).map_err(|e| ManifestError::InvalidArtifact {
                artifact: name.to_string(),
                message: e.to_string(),
            }),
        )
    }
}

/// manifest.json 全体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: String,
    /// ファイル内の記述順を保持する
    #[serde(default)]
    pub artifacts: IndexMap<String, ArtifactManifest>,
}

impl AssemblyManifest {
    /// manifest.json を読み込む
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let manifest: AssemblyManifest = read_json(path)?;
        info!(
            version = %manifest.version,
            artifacts = manifest.artifacts.len(),
            "Loaded assembly manifest"
        );
        Ok(manifest)
    }

    /// assembly ディレクトリから manifest.json を読み込む
    pub fn load_from_directory(assembly_dir: &Path) -> Result<Self> {
        Self::load(&assembly_dir.join(ASSEMBLY_MANIFEST_FILE))
    }

    /// asset manifest artifact の (名前, ファイル) を記述順に返す
    pub fn asset_manifest_files(&self) -> Result<Vec<(&str, String)>> {
        let mut files = Vec::new();
        for (name, artifact) in &self.artifacts {
            match artifact.asset_manifest_properties(name) {
                Some(properties) => files.push((name.as_str(), properties?.file)),
                None => {
                    debug!(artifact = %name, kind = %artifact.artifact_type, "Skipping artifact");
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
        "version": "36.0.0",
        "artifacts": {
            "WebStack.assets": {
                "type": "cdk:asset-manifest",
                "properties": {
                    "file": "WebStack.assets.json",
                    "requiresBootstrapStackVersion": 6
                }
            },
            "WebStack": {
                "type": "aws:cloudformation:stack",
                "environment": "aws://unknown-account/unknown-region",
                "properties": { "templateFile": "WebStack.template.json" },
                "dependencies": ["WebStack.assets"]
            },
            "Tree": {
                "type": "cdk:tree",
                "properties": { "file": "tree.json" }
            },
            "ApiStack.assets": {
                "type": "cdk:asset-manifest",
                "properties": { "file": "ApiStack.assets.json" }
            }
        }
    }"#;

    #[test]
    fn test_parse_artifact_types() {
        let manifest: AssemblyManifest = serde_json::from_str(MANIFEST).unwrap();
        let types: Vec<_> = manifest
            .artifacts
            .values()
            .map(|a| a.artifact_type.clone())
            .collect();
        assert_eq!(
            types,
            vec![
                ArtifactType::AssetManifest,
                ArtifactType::CloudFormationStack,
                ArtifactType::Tree,
                ArtifactType::AssetManifest,
            ]
        );
    }

    #[test]
    fn test_unknown_artifact_type_is_kept() {
        let manifest: AssemblyManifest = serde_json::from_str(
            r#"{"version": "1.0.0", "artifacts": {"x": {"type": "cdk:something-new"}}}"#,
        )
        .unwrap();
        assert_eq!(
            manifest.artifacts["x"].artifact_type,
            ArtifactType::Other("cdk:something-new".to_string())
        );
    }

    #[test]
    fn test_missing_artifacts_is_empty() {
        let manifest: AssemblyManifest = serde_json::from_str(r#"{"version": "1.0.0"}"#).unwrap();
        assert!(manifest.artifacts.is_empty());
        assert!(manifest.asset_manifest_files().unwrap().is_empty());
    }

    #[test]
    fn test_asset_manifest_files_in_declaration_order() {
        let manifest: AssemblyManifest = serde_json::from_str(MANIFEST).unwrap();
        let files = manifest.asset_manifest_files().unwrap();
        assert_eq!(
            files,
            vec![
                ("WebStack.assets", "WebStack.assets.json".to_string()),
                ("ApiStack.assets", "ApiStack.assets.json".to_string()),
            ]
        );
    }

    #[test]
    fn test_asset_manifest_without_file_is_error() {
        let manifest: AssemblyManifest = serde_json::from_str(
            r#"{"version": "1.0.0", "artifacts": {"Broken.assets": {"type": "cdk:asset-manifest", "properties": {}}}}"#,
        )
        .unwrap();

        let err = manifest.asset_manifest_files().unwrap_err();
        match err {
            ManifestError::InvalidArtifact { artifact, .. } => assert_eq!(artifact, "Broken.assets"),
            other => panic!("Expected InvalidArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(ASSEMBLY_MANIFEST_FILE), MANIFEST).unwrap();

        let manifest = AssemblyManifest::load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(manifest.version, "36.0.0");
        assert_eq!(manifest.artifacts.len(), 4);
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp_dir = tempdir().unwrap();
        let result = AssemblyManifest::load_from_directory(temp_dir.path());
        assert!(matches!(result, Err(ManifestError::Read { .. })));
    }
}
