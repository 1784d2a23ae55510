//! ビルダー設定
//!
//! 使用する docker 実行ファイルは環境変数 `CDK_DOCKER` で差し替えられる。

use std::collections::BTreeMap;

/// docker 実行ファイルを差し替える環境変数
pub const DOCKER_EXECUTABLE_ENV: &str = "CDK_DOCKER";

const DEFAULT_EXECUTABLE: &str = "docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// 実行ファイル名またはパス (docker, podman, finch など)
    pub executable: String,
    /// 子プロセスに追加で渡す環境変数
    pub env: BTreeMap<String, String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl BuilderConfig {
    /// 環境変数から設定を作成
    pub fn from_env() -> Self {
        let executable = std::env::var(DOCKER_EXECUTABLE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string());

        tracing::debug!(executable = %executable, "Resolved docker executable");

        Self {
            executable,
            ..Default::default()
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
