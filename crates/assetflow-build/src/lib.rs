//! AssetFlow image builders
//!
//! このクレートはコンテナイメージのビルド手段を提供します。
//! docker CLI を呼び出す `DockerCli` と、Docker Engine API を直接使う
//! `EngineBuilder` のどちらも `ImageBuilder` トレイトを実装します。

pub mod builder;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod options;

pub use builder::ImageBuilder;
pub use cli::{DockerCli, cache_option_flag};
pub use config::{BuilderConfig, DOCKER_EXECUTABLE_ENV};
pub use context::{ContextBuilder, DOCKERIGNORE_FILE, DockerIgnore};
pub use engine::EngineBuilder;
pub use error::{BuildError, BuildResult};
pub use options::BuildOptions;
