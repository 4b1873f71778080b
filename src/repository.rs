//! Repository references and transient checkouts.
//!
//! A [`RepositoryReference`] is parsed from a user-supplied GitHub URL. The
//! [`RepositoryFetcher`] clones it with the `git` binary into a temporary
//! directory owned by a [`Checkout`]; dropping the checkout removes it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{DocError, Result};

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];
const SSH_PREFIX: &str = "git@github.com:";

/// Owner and name of a GitHub repository, plus the URL it was parsed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReference {
    owner: String,
    name: String,
    url: String,
    clone_url: String,
}

impl RepositoryReference {
    /// Parses a GitHub repository URL
    ///
    /// Accepts `https://github.com/owner/repo`, the same with a trailing `/`
    /// or `.git`, scheme-less `github.com/owner/repo` and the SSH form
    /// `git@github.com:owner/repo.git`. The last two path segments are taken
    /// as owner and name. Scheme-less input is cloned over `https://`.
    pub fn parse(input: &str) -> Result<Self> {
        let url = input.trim();
        if !url.contains("github.com") {
            return Err(DocError::InvalidReference(format!("not a GitHub URL: {}", url)));
        }

        let (path, clone_url) = if let Some(rest) = url.strip_prefix(SSH_PREFIX) {
            (rest.to_string(), url.to_string())
        } else {
            let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{}", url)))?;
            match parsed.host_str() {
                Some(host) if GITHUB_HOSTS.contains(&host) => {}
                _ => {
                    return Err(DocError::InvalidReference(format!(
                        "not a GitHub URL: {}",
                        url
                    )))
                }
            }
            (parsed.path().to_string(), parsed.to_string())
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [.., owner, name] => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
                url: url.to_string(),
                clone_url,
            }),
            _ => Err(DocError::InvalidReference(format!(
                "expected https://github.com/<owner>/<repo>, got {}",
                url
            ))),
        }
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The URL this reference was parsed from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL handed to `git clone`
    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A cloned working tree that is removed when dropped
#[derive(Debug)]
pub struct Checkout {
    dir: TempDir,
    path: PathBuf,
}

impl Checkout {
    /// Root of the working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the checkout now, logging instead of failing on errors
    pub fn close(self) {
        let location = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %location.display(), "Removed checkout"),
            Err(e) => warn!(path = %location.display(), error = %e, "Failed to remove checkout"),
        }
    }
}

/// Clones repositories into temporary checkouts
#[derive(Debug, Clone)]
pub struct RepositoryFetcher {
    git: PathBuf,
    timeout: Duration,
}

impl RepositoryFetcher {
    /// Creates a fetcher that runs `git` from `PATH`
    pub fn new(timeout: Duration) -> Self {
        Self {
            git: PathBuf::from("git"),
            timeout,
        }
    }

    /// Uses a specific git executable
    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    /// Clones `url` into a fresh temporary directory
    ///
    /// Fails with [`DocError::Fetch`] when git cannot be started or exits
    /// unsuccessfully, and with [`DocError::Timeout`] when the clone exceeds
    /// the configured deadline. The partial checkout is removed on failure.
    pub async fn fetch(&self, url: &str) -> Result<Checkout> {
        let dir = tempfile::Builder::new().prefix("docgen-").tempdir()?;
        let path = dir.path().join("repo");

        info!(url, path = %path.display(), "Cloning repository");

        let child = Command::new(&self.git)
            .arg("clone")
            .arg("--quiet")
            .arg("--")
            .arg(url)
            .arg(&path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DocError::Fetch(format!("failed to launch {}: {}", self.git.display(), e))
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| DocError::Fetch(format!("git clone failed: {}", e)))?,
            Err(_) => {
                warn!(url, timeout_secs = self.timeout.as_secs(), "git clone timed out");
                return Err(DocError::Timeout {
                    operation: "git clone",
                    after: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url, status = %output.status, stderr = %stderr.trim(), "git clone failed");
            return Err(DocError::Fetch(format!(
                "git clone exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!(url, "Cloned repository");
        Ok(Checkout { dir, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://github.com/rust-lang/rust" ; "plain")]
    #[test_case("https://github.com/rust-lang/rust.git" ; "git suffix")]
    #[test_case("https://github.com/rust-lang/rust/" ; "trailing slash")]
    #[test_case("  https://github.com/rust-lang/rust  " ; "surrounding whitespace")]
    #[test_case("github.com/rust-lang/rust" ; "no scheme")]
    #[test_case("git@github.com:rust-lang/rust.git" ; "ssh")]
    fn parses_owner_and_name(url: &str) {
        let reference = RepositoryReference::parse(url).unwrap();
        assert_eq!(reference.owner(), "rust-lang");
        assert_eq!(reference.name(), "rust");
    }

    #[test]
    fn git_suffix_is_stripped_exactly() {
        // Only the literal suffix goes; trailing letters from `.git` stay.
        let reference = RepositoryReference::parse("https://github.com/owner/config-tig").unwrap();
        assert_eq!(reference.name(), "config-tig");
    }

    #[test_case("github.com/rust-lang/rust", "https://github.com/rust-lang/rust" ; "scheme added")]
    #[test_case("https://github.com/rust-lang/rust.git", "https://github.com/rust-lang/rust.git" ; "https kept")]
    #[test_case("git@github.com:rust-lang/rust.git", "git@github.com:rust-lang/rust.git" ; "ssh kept")]
    fn clone_url_is_cloneable(input: &str, expected: &str) {
        let reference = RepositoryReference::parse(input).unwrap();
        assert_eq!(reference.clone_url(), expected);
        assert_eq!(reference.url(), input);
    }

    #[test]
    fn keeps_original_url() {
        let reference = RepositoryReference::parse(" https://github.com/a/b.git ").unwrap();
        assert_eq!(reference.url(), "https://github.com/a/b.git");
        assert_eq!(reference.to_string(), "a/b");
    }

    #[test_case("https://gitlab.com/owner/repo" ; "other host")]
    #[test_case("https://example.com/github.com/repo" ; "github in path only")]
    #[test_case("https://github.com/owner" ; "single segment")]
    #[test_case("https://github.com/" ; "no segments")]
    #[test_case("" ; "empty")]
    fn rejects(url: &str) {
        assert!(matches!(
            RepositoryReference::parse(url),
            Err(DocError::InvalidReference(_)) | Err(DocError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn missing_git_binary_is_a_fetch_error() {
        let fetcher = RepositoryFetcher::new(Duration::from_secs(5))
            .with_git_binary("/nonexistent/bin/git-for-tests");
        let err = fetcher.fetch("https://github.com/owner/repo").await.unwrap_err();
        assert!(matches!(err, DocError::Fetch(_)));
    }

    #[tokio::test]
    async fn clones_local_repository_and_cleans_up() {
        if std::process::Command::new("git").arg("--version").output().is_err() {
            return;
        }

        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("main.rs"), "fn main() {}\n").unwrap();
        let git = |args: &[&str]| {
            std::process::Command::new("git")
                .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
                .args(args)
                .current_dir(source.path())
                .output()
                .unwrap()
        };
        git(&["init", "--quiet"]);
        git(&["add", "."]);
        git(&["commit", "--quiet", "-m", "init"]);

        let fetcher = RepositoryFetcher::new(Duration::from_secs(30));
        let checkout = fetcher.fetch(&source.path().to_string_lossy()).await.unwrap();
        let root = checkout.path().to_path_buf();
        assert!(root.join("main.rs").is_file());

        checkout.close();
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn failed_clone_is_a_fetch_error() {
        if std::process::Command::new("git").arg("--version").output().is_err() {
            return;
        }
        let missing = TempDir::new().unwrap().path().join("does-not-exist");
        let fetcher = RepositoryFetcher::new(Duration::from_secs(30));
        let err = fetcher.fetch(&missing.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, DocError::Fetch(_)));
    }
}
