use assetflow_build::{BuildError, BuildOptions, BuildResult, ImageBuilder};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// テスト用の cloud assembly ディレクトリ
pub struct TestAssembly {
    pub root: TempDir,
    artifacts: serde_json::Map<String, Value>,
}

impl TestAssembly {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self {
            root,
            artifacts: serde_json::Map::new(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// asset manifest artifact とそのファイルを追加
    pub fn add_asset_manifest(&mut self, artifact: &str, file: &str, assets: Value) -> &mut Self {
        fs::write(self.root.path().join(file), assets.to_string()).unwrap();
        self.add_artifact(
            artifact,
            json!({ "type": "cdk:asset-manifest", "properties": { "file": file } }),
        )
    }

    pub fn add_artifact(&mut self, name: &str, artifact: Value) -> &mut Self {
        self.artifacts.insert(name.to_string(), artifact);
        self
    }

    #[allow(dead_code)]
    pub fn create_context(&self, directory: &str) -> PathBuf {
        let dir = self.root.path().join(directory);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Dockerfile"), "FROM alpine\nCMD [\"true\"]").unwrap();
        dir
    }

    /// manifest.json を書き出す
    pub fn write_manifest(&self) {
        let manifest = json!({
            "version": "36.0.0",
            "artifacts": Value::Object(self.artifacts.clone()),
        });
        fs::write(self.root.path().join("manifest.json"), manifest.to_string()).unwrap();
    }
}

/// 1つの docker-image アセット定義
pub fn docker_image(asset_id: &str, source: Value) -> (String, Value) {
    (
        asset_id.to_string(),
        json!({
            "source": source,
            "destinations": {
                "current_account-current_region": {
                    "repositoryName": "cdk-hnb659fds-container-assets",
                    "imageTag": asset_id,
                }
            }
        }),
    )
}

/// docker-image アセットだけを含む asset manifest
pub fn image_manifest(images: Vec<(String, Value)>) -> Value {
    let images: serde_json::Map<String, Value> = images.into_iter().collect();
    json!({ "version": "36.0.0", "dockerImages": images })
}

/// 2つのイメージを持つ assembly: abc123 (ターゲットなし) と def456 (prod)
#[allow(dead_code)]
pub fn two_image_assembly() -> TestAssembly {
    let mut assembly = TestAssembly::new();
    assembly.add_asset_manifest(
        "WebStack.assets",
        "WebStack.assets.json",
        image_manifest(vec![
            docker_image("abc123", json!({ "directory": "asset.abc123" })),
            docker_image(
                "def456",
                json!({ "directory": "asset.def456", "dockerBuildTarget": "prod" }),
            ),
        ]),
    );
    assembly.add_artifact(
        "WebStack",
        json!({ "type": "aws:cloudformation:stack", "properties": { "templateFile": "WebStack.template.json" } }),
    );
    assembly.write_manifest();
    assembly.create_context("asset.abc123");
    assembly.create_context("asset.def456");
    assembly
}

/// 呼び出しを記録するだけのビルダー
#[derive(Default)]
pub struct RecordingBuilder {
    builds: Mutex<Vec<BuildOptions>>,
    built_tags: Mutex<HashSet<String>>,
    failing_tags: HashSet<String>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, tag: &str) -> Self {
        self.failing_tags.insert(tag.to_string());
        self
    }

    pub fn with_delay(mut self, tag: &str, delay: Duration) -> Self {
        self.delays.insert(tag.to_string(), delay);
        self
    }

    pub fn builds(&self) -> Vec<BuildOptions> {
        self.builds.lock().unwrap().clone()
    }

    pub fn build_count(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBuilder for RecordingBuilder {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn build(&self, options: &BuildOptions) -> BuildResult<()> {
        self.builds.lock().unwrap().push(options.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&options.tag)
            .copied()
            .unwrap_or(Duration::from_millis(10));
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_tags.contains(&options.tag) {
            return Err(BuildError::CommandFailed {
                tag: options.tag.clone(),
                message: "failed to solve: process \"/bin/sh -c exit 1\" did not complete successfully".to_string(),
            });
        }

        self.built_tags.lock().unwrap().insert(options.tag.clone());
        Ok(())
    }

    async fn exists(&self, tag: &str) -> BuildResult<bool> {
        Ok(self.built_tags.lock().unwrap().contains(tag))
    }
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
