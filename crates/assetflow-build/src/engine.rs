//! Docker Engine API ビルダー
//!
//! docker CLI を使わずにデーモンへ直接ビルドを依頼する。クラシックビルダーの
//! API では表現できないオプションは黙って捨てずにエラーにする。

use crate::builder::ImageBuilder;
use crate::context::{ContextBuilder, DEFAULT_DOCKERFILE};
use crate::error::{BuildError, BuildResult};
use crate::options::BuildOptions;
use async_trait::async_trait;
use bollard::Docker;
#[allow(deprecated)]
use bollard::image::BuildImageOptions;
use futures_util::stream::StreamExt;
use std::collections::HashMap;

const BUILDER_NAME: &str = "docker-engine";

/// Engine API でビルドするビルダー
///
/// ビルドコンテキストは `.dockerignore` を反映した tar.gz として送る。
pub struct EngineBuilder {
    docker: Docker,
}

impl EngineBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// ローカルのデフォルト設定でデーモンに接続
    pub fn connect_with_local_defaults() -> BuildResult<Self> {
        Ok(Self::new(Docker::connect_with_local_defaults()?))
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Engine API で扱えないオプションを検出
    fn check_supported(options: &BuildOptions) -> BuildResult<()> {
        let unsupported = if !options.build_secrets.is_empty() {
            Some("build secrets")
        } else if !options.outputs.is_empty() {
            Some("build outputs")
        } else if options.cache_to.is_some() {
            Some("cache export (cache-to)")
        } else if options
            .cache_from
            .iter()
            .any(|cache| cache.cache_type != "registry" || !cache.params.contains_key("ref"))
        {
            Some("non-registry cache import")
        } else {
            None
        };

        match unsupported {
            Some(option) => Err(BuildError::Unsupported {
                builder: BUILDER_NAME,
                option,
            }),
            None => Ok(()),
        }
    }

    /// ビルド出力の処理
    fn handle_build_output(&self, tag: &str, output: bollard::models::BuildInfo) -> BuildResult<()> {
        if let Some(stream) = output.stream {
            let line = stream.trim_end();
            if !line.is_empty() {
                tracing::debug!(tag = %tag, "{}", line);
            }
        }

        if let Some(error) = output.error {
            return Err(BuildError::BuildFailed(error));
        }

        if let Some(error_detail) = output.error_detail {
            let error_msg = error_detail
                .message
                .unwrap_or_else(|| "Unknown build error".to_string());
            return Err(BuildError::BuildFailed(error_msg));
        }

        if let Some(status) = output.status {
            tracing::debug!(tag = %tag, status = %status, "Build status");
        }

        Ok(())
    }
}

#[async_trait]
impl ImageBuilder for EngineBuilder {
    fn name(&self) -> &'static str {
        BUILDER_NAME
    }

    async fn build(&self, options: &BuildOptions) -> BuildResult<()> {
        Self::check_supported(options)?;

        tracing::info!(
            tag = %options.tag,
            directory = %options.directory.display(),
            "Building image via engine API"
        );

        let dockerfile = options.file.as_deref().unwrap_or(DEFAULT_DOCKERFILE);
        let context_data = ContextBuilder::create_context(&options.directory, dockerfile)?;

        let build_args: HashMap<&str, &str> = options
            .build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let cache_from: Vec<&str> = options
            .cache_from
            .iter()
            .filter_map(|cache| cache.params.get("ref").map(String::as_str))
            .collect();

        #[allow(deprecated)]
        let build_options = BuildImageOptions {
            dockerfile,
            t: options.tag.as_str(),
            buildargs: build_args,
            target: options.target.as_deref().unwrap_or(""),
            networkmode: options.network_mode.as_deref().unwrap_or(""),
            platform: options.platform.as_deref().unwrap_or(""),
            cachefrom: cache_from,
            nocache: options.cache_disabled,
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        tracing::debug!("Build options: {:?}", build_options);

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(context_data));
        #[allow(deprecated)]
        let mut stream = self
            .docker
            .build_image(build_options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => self.handle_build_output(&options.tag, output)?,
                Err(e) => return Err(BuildError::DockerConnection(e)),
            }
        }

        tracing::info!(tag = %options.tag, "Successfully built");
        Ok(())
    }

    async fn exists(&self, tag: &str) -> BuildResult<bool> {
        match self.docker.inspect_image(tag).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                ..
            }) => Ok(false),
            Err(e) => Err(BuildError::DockerConnection(e)),
        }
    }
}
