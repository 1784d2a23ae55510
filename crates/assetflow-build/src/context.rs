use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io::Write;
use std::path::Path;
use tar::Builder;

/// Dockerfile が指定されないときのファイル名
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// 除外ルールを書くファイル
pub const DOCKERIGNORE_FILE: &str = ".dockerignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    exception: bool,
}

/// `.dockerignore` の除外ルール
///
/// 後に書かれたルールが優先され、`!` で始まる行は除外を取り消す。
/// ディレクトリにマッチしたルールはその中身にも適用される。
#[derive(Debug, Clone, Default)]
pub struct DockerIgnore {
    rules: Vec<IgnoreRule>,
}

impl DockerIgnore {
    /// ファイルの内容からルールを読み込む
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (exception, raw) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            let normalized = normalize(raw);
            if normalized.is_empty() {
                continue;
            }

            match Pattern::new(normalized) {
                Ok(pattern) => rules.push(IgnoreRule { pattern, exception }),
                Err(e) => {
                    tracing::warn!(
                        pattern = %raw,
                        error = %e,
                        "Skipping invalid .dockerignore pattern"
                    );
                }
            }
        }

        Self { rules }
    }

    /// コンテキスト直下の `.dockerignore` を読み込む（なければ空）
    pub fn load(context_path: &Path) -> BuildResult<Self> {
        let path = context_path.join(DOCKERIGNORE_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(Self::parse(&content))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn has_exceptions(&self) -> bool {
        self.rules.iter().any(|rule| rule.exception)
    }

    /// コンテキストからの相対パス (`/` 区切り) が除外されるか
    pub fn is_excluded(&self, relative: &str) -> bool {
        let relative = normalize(relative);
        let mut excluded = false;

        for rule in &self.rules {
            if matches_path_or_parent(&rule.pattern, relative) {
                excluded = !rule.exception;
            }
        }

        excluded
    }
}

fn normalize(path: &str) -> &str {
    let mut path = path.trim_end_matches('/');
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_start_matches('/')
}

fn matches_path_or_parent(pattern: &Pattern, relative: &str) -> bool {
    if pattern.matches_with(relative, MATCH_OPTIONS) {
        return true;
    }
    relative
        .match_indices('/')
        .any(|(index, _)| pattern.matches_with(&relative[..index], MATCH_OPTIONS))
}

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストをtar.gzアーカイブとして作成
    ///
    /// `dockerfile` はコンテキストからの相対パスで、コンテキスト内に存在する必要がある。
    /// `.dockerignore` で除外されたファイルは含めない。Dockerfile と `.dockerignore`
    /// 自体は docker CLI と同じく常に含める。
    pub fn create_context(context_path: &Path, dockerfile: &str) -> BuildResult<Vec<u8>> {
        tracing::debug!("Creating build context from: {}", context_path.display());

        if !context_path.is_dir() {
            return Err(BuildError::ContextNotFound(context_path.to_path_buf()));
        }

        let dockerfile_path = context_path.join(dockerfile);
        if !dockerfile_path.is_file() {
            return Err(BuildError::DockerfileNotFound(dockerfile_path));
        }

        let ignore = DockerIgnore::load(context_path)?;
        if !ignore.is_empty() {
            tracing::debug!(rules = ignore.rules.len(), "Applying .dockerignore");
        }

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);
            tar.follow_symlinks(false);

            let walker = ContextWalker {
                root: context_path,
                dockerfile: normalize(dockerfile),
                ignore: &ignore,
            };
            walker.append_dir(&mut tar, context_path, "")?;

            tar.into_inner()
                .and_then(|encoder| encoder.finish())
                .map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());

        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "Build context is large ({}MB); consider excluding files with .dockerignore",
                size / 1024 / 1024
            );
        }
    }
}

struct ContextWalker<'a> {
    root: &'a Path,
    dockerfile: &'a str,
    ignore: &'a DockerIgnore,
}

impl ContextWalker<'_> {
    fn always_included(&self, relative: &str) -> bool {
        relative == self.dockerfile || relative == DOCKERIGNORE_FILE
    }

    fn append_dir<W: Write>(
        &self,
        tar: &mut Builder<W>,
        dir: &Path,
        prefix: &str,
    ) -> BuildResult<()> {
        let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let relative = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            let path = entry.path();
            let is_dir = entry.file_type()?.is_dir();

            let excluded = self.ignore.is_excluded(&relative);

            if is_dir {
                if !excluded {
                    tar.append_dir(&relative, &path)?;
                    self.append_dir(tar, &path, &relative)?;
                } else if self.ignore.has_exceptions()
                    || self.dockerfile.starts_with(&format!("{}/", relative))
                {
                    // 除外の取り消しや Dockerfile が中にある可能性がある
                    self.append_dir(tar, &path, &relative)?;
                }
            } else if !excluded || self.always_included(&relative) {
                tar.append_path_with_name(&path, &relative)?;
            }
        }

        tracing::trace!(root = %self.root.display(), dir = %prefix, "Context directory archived");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_context() {
        let temp_dir = tempdir().unwrap();

        fs::write(temp_dir.path().join("app.py"), "print('hi')").unwrap();
        let subdir = temp_dir.path().join("src");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("lib.py"), "x = 1").unwrap();
        fs::write(temp_dir.path().join("Dockerfile"), "FROM alpine\nCOPY . /app").unwrap();

        let archive = ContextBuilder::create_context(temp_dir.path(), DEFAULT_DOCKERFILE).unwrap();
        assert!(!archive.is_empty());

        // tarアーカイブとして展開できるか確認
        let extract_dir = tempdir().unwrap();
        let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
        let mut tar = tar::Archive::new(decoder);
        tar.unpack(extract_dir.path()).unwrap();

        assert!(extract_dir.path().join("Dockerfile").exists());
        assert!(extract_dir.path().join("src/lib.py").exists());
    }

    fn unpack(archive: Vec<u8>) -> tempfile::TempDir {
        let extract_dir = tempdir().unwrap();
        let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
        tar::Archive::new(decoder).unpack(extract_dir.path()).unwrap();
        extract_dir
    }

    #[test]
    fn test_create_context_honors_dockerignore() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Dockerfile"), "FROM alpine\nCOPY . /app").unwrap();
        fs::write(
            root.join(".dockerignore"),
            "# local files\nnode_modules\n*.log\n!keep.log\nDockerfile\n",
        )
        .unwrap();
        fs::write(root.join("app.js"), "1").unwrap();
        fs::write(root.join("debug.log"), "noise").unwrap();
        fs::write(root.join("keep.log"), "kept").unwrap();
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        fs::write(root.join("node_modules/left-pad/index.js"), "x").unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/trace.log"), "nested").unwrap();

        let archive = ContextBuilder::create_context(root, DEFAULT_DOCKERFILE).unwrap();
        let extracted = unpack(archive);
        let out = extracted.path();

        assert!(out.join("app.js").exists());
        assert!(out.join("keep.log").exists());
        assert!(out.join("Dockerfile").exists());
        assert!(out.join(".dockerignore").exists());
        assert!(!out.join("debug.log").exists());
        assert!(!out.join("node_modules").exists());
        // `*.log` はルート直下だけにマッチする
        assert!(out.join("src/trace.log").exists());
    }

    #[test]
    fn test_create_context_keeps_dockerfile_in_ignored_directory() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("docker")).unwrap();
        fs::write(root.join("docker/Dockerfile.api"), "FROM alpine").unwrap();
        fs::write(root.join("docker/notes.txt"), "skip").unwrap();
        fs::write(root.join(".dockerignore"), "docker/").unwrap();

        let archive = ContextBuilder::create_context(root, "docker/Dockerfile.api").unwrap();
        let extracted = unpack(archive);

        assert!(extracted.path().join("docker/Dockerfile.api").exists());
        assert!(!extracted.path().join("docker/notes.txt").exists());
    }

    #[test]
    fn test_dockerignore_last_rule_wins() {
        let ignore = DockerIgnore::parse("*.md\n!README.md\n");
        assert!(ignore.is_excluded("CHANGELOG.md"));
        assert!(!ignore.is_excluded("README.md"));
        assert!(!ignore.is_excluded("docs/guide.md"));

        let ignore = DockerIgnore::parse("!README.md\n*.md\n");
        assert!(ignore.is_excluded("README.md"));
    }

    #[test]
    fn test_dockerignore_matches_parent_directory() {
        let ignore = DockerIgnore::parse("/target/\n**/*.tmp\n./cache\n");
        assert!(ignore.is_excluded("target"));
        assert!(ignore.is_excluded("target/debug/app"));
        assert!(ignore.is_excluded("a/b/c.tmp"));
        assert!(ignore.is_excluded("cache/data"));
        assert!(!ignore.is_excluded("src/target.rs"));
    }

    #[test]
    fn test_dockerignore_without_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let ignore = DockerIgnore::load(temp_dir.path()).unwrap();
        assert!(ignore.is_empty());
        assert!(!ignore.is_excluded("anything"));
    }

    #[test]
    fn test_create_context_custom_dockerfile() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("Dockerfile.prod"), "FROM alpine").unwrap();

        let result = ContextBuilder::create_context(temp_dir.path(), "Dockerfile.prod");
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_context_missing_dockerfile() {
        let temp_dir = tempdir().unwrap();

        let result = ContextBuilder::create_context(temp_dir.path(), DEFAULT_DOCKERFILE);
        assert!(matches!(result, Err(BuildError::DockerfileNotFound(_))));
    }

    #[test]
    fn test_create_context_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("asset.gone");

        let result = ContextBuilder::create_context(&missing, DEFAULT_DOCKERFILE);
        assert!(matches!(result, Err(BuildError::ContextNotFound(_))));
    }
}
