//! docker CLI ビルダー
//!
//! `docker build` をビルドコンテキストをカレントディレクトリにして実行する。
//! BuildKit 前提のオプション (secret, output, cache-to) もそのまま渡せる。

use crate::builder::ImageBuilder;
use crate::config::BuilderConfig;
use crate::error::{BuildError, BuildResult};
use crate::options::BuildOptions;
use assetflow_manifest::DockerCacheOption;
use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// docker CLI wrapper
#[derive(Debug, Clone, Default)]
pub struct DockerCli {
    config: BuilderConfig,
}

impl DockerCli {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// `CDK_DOCKER` を考慮して作成
    pub fn from_env() -> Self {
        Self::new(BuilderConfig::from_env())
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// `build` サブコマンドの引数を組み立てる
    pub fn build_command_args(options: &BuildOptions) -> Vec<String> {
        let mut args = vec!["build".to_string()];

        for (key, value) in &options.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{}={}", key, value));
        }

        for (id, secret) in &options.build_secrets {
            args.push("--secret".to_string());
            args.push(format!("id={},{}", id, secret));
        }

        args.push("--tag".to_string());
        args.push(options.tag.clone());

        if let Some(target) = &options.target {
            args.push("--target".to_string());
            args.push(target.clone());
        }

        if let Some(file) = &options.file {
            args.push("--file".to_string());
            args.push(file.clone());
        }

        if let Some(network) = &options.network_mode {
            args.push("--network".to_string());
            args.push(network.clone());
        }

        if let Some(platform) = &options.platform {
            args.push("--platform".to_string());
            args.push(platform.clone());
        }

        for output in &options.outputs {
            args.push(format!("--output={}", output));
        }

        for cache in &options.cache_from {
            args.push("--cache-from".to_string());
            args.push(cache_option_flag(cache));
        }

        if let Some(cache) = &options.cache_to {
            args.push("--cache-to".to_string());
            args.push(cache_option_flag(cache));
        }

        if options.cache_disabled {
            args.push("--no-cache".to_string());
        }

        args.push(".".to_string());
        args
    }

    /// コマンドを実行して出力を返す
    async fn execute(&self, args: &[String], cwd: Option<&Path>) -> BuildResult<Output> {
        let mut cmd = Command::new(&self.config.executable);
        cmd.args(args);
        cmd.envs(&self.config.env);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!("Running: {} {}", self.config.executable, args.join(" "));

        cmd.output().await.map_err(|source| BuildError::Spawn {
            executable: self.config.executable.clone(),
            source,
        })
    }
}

/// キャッシュ指定を `type=...,key=value` 形式に変換
pub fn cache_option_flag(option: &DockerCacheOption) -> String {
    let mut flag = format!("type={}", option.cache_type);
    for (key, value) in &option.params {
        flag.push_str(&format!(",{}={}", key, value));
    }
    flag
}

#[async_trait]
impl ImageBuilder for DockerCli {
    fn name(&self) -> &'static str {
        "docker-cli"
    }

    async fn build(&self, options: &BuildOptions) -> BuildResult<()> {
        if !options.directory.is_dir() {
            return Err(BuildError::ContextNotFound(options.directory.clone()));
        }

        tracing::info!(
            tag = %options.tag,
            directory = %options.directory.display(),
            "Building image"
        );

        let args = Self::build_command_args(options);
        let output = self.execute(&args, Some(&options.directory)).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(tag = %options.tag, "{}", stdout.trim_end());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("{} exited with {}", self.config.executable, output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(BuildError::CommandFailed {
                tag: options.tag.clone(),
                message,
            });
        }

        tracing::info!(tag = %options.tag, "Successfully built");
        Ok(())
    }

    async fn exists(&self, tag: &str) -> BuildResult<bool> {
        let args = ["inspect".to_string(), tag.to_string()];
        let output = self.execute(&args, None).await?;
        Ok(output.status.success())
    }
}
