use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Failed to run {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build of '{tag}' failed: {message}")]
    CommandFailed { tag: String, message: String },

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("{builder} does not support {option}")]
    Unsupported {
        builder: &'static str,
        option: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     cdk synth を実行して assembly を再生成してください。",
                    path.display()
                )
            }
            BuildError::Spawn { executable, source } => {
                format!(
                    "{} を実行できません: {}\n\
                     \n\
                     解決方法:\n\
                     1. Docker がインストールされているか確認してください\n\
                     2. 別の実行ファイルを使う場合は CDK_DOCKER を設定してください",
                    executable, source
                )
            }
            BuildError::CommandFailed { tag, message } => {
                format!(
                    "ビルドに失敗しました ({}): {}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    tag, message
                )
            }
            BuildError::BuildFailed(message) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    message
                )
            }
            BuildError::Unsupported { builder, option } => {
                format!(
                    "{} は {} に対応していません。\n\
                     \n\
                     docker CLI を使うビルダー (DockerCli) を使用してください。",
                    builder, option
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
