//! Repository analysis: clone, select files, summarize.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::AnalysisConfig;
use crate::error::{DocError, Result};
use crate::repository::{RepositoryFetcher, RepositoryReference};
use crate::selector::{truncate_chars, ExtractedFile, FileSelector};

/// Extension groups list at most this many paths before "... and N more"
const LISTED_FILES_PER_EXTENSION: usize = 5;

/// Summary text used when a repository yields no files
pub const NO_CODE_FILES: &str = "No code files found in repository.";

/// The result of analyzing one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    /// URL the repository was cloned from
    pub url: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Number of files in `code_files`
    pub files_analyzed: usize,
    /// Selected files in walk order
    pub code_files: Vec<ExtractedFile>,
}

impl RepositoryAnalysis {
    /// Builds an analysis from a reference and the files selected from its checkout
    pub fn new(reference: &RepositoryReference, code_files: Vec<ExtractedFile>) -> Self {
        Self {
            url: reference.url().to_string(),
            owner: reference.owner().to_string(),
            name: reference.name().to_string(),
            files_analyzed: code_files.len(),
            code_files,
        }
    }

    /// Textual overview: owner/name, file count and files grouped by extension
    pub fn summary(&self) -> String {
        if self.code_files.is_empty() {
            return NO_CODE_FILES.to_string();
        }

        let mut summary = format!(
            "Repository: {}/{}\nFiles analyzed: {}\n\nFile structure:\n",
            self.owner, self.name, self.files_analyzed
        );

        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
        for file in &self.code_files {
            groups
                .entry(file.extension.as_str())
                .or_insert_with(|| {
                    order.push(file.extension.as_str());
                    Vec::new()
                })
                .push(file.path.as_str());
        }

        for extension in order {
            let paths = &groups[extension];
            let listed = &paths[..paths.len().min(LISTED_FILES_PER_EXTENSION)];
            let _ = write!(summary, "{} files: {}", extension, listed.join(", "));
            if paths.len() > LISTED_FILES_PER_EXTENSION {
                let _ = write!(summary, " ... and {} more", paths.len() - LISTED_FILES_PER_EXTENSION);
            }
            summary.push('\n');
        }

        summary
    }

    /// Summary followed by the opening of the first `files` files
    pub fn digest(&self, files: usize, chars_per_file: usize) -> String {
        let mut digest = self.summary();
        if files == 0 || self.code_files.is_empty() {
            return digest;
        }

        digest.push_str("\nCode samples:\n");
        for file in self.code_files.iter().take(files) {
            let sample = truncate_chars(&file.content, chars_per_file);
            let _ = write!(digest, "\nFile: {}\n```\n{}\n```\n", file.path, sample.text);
        }
        digest
    }
}

/// Clones repositories and extracts an analysis from them
#[derive(Debug, Clone)]
pub struct RepositoryAnalyzer {
    fetcher: RepositoryFetcher,
    selector: FileSelector,
    sample_files: usize,
    sample_chars: usize,
}

impl RepositoryAnalyzer {
    /// Creates an analyzer from its parts
    pub fn new(fetcher: RepositoryFetcher, selector: FileSelector) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            fetcher,
            selector,
            sample_files: defaults.sample_files,
            sample_chars: defaults.sample_chars,
        }
    }

    /// Creates an analyzer from the analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            fetcher: RepositoryFetcher::new(config.clone_timeout),
            selector: FileSelector::from_config(config),
            sample_files: config.sample_files,
            sample_chars: config.sample_chars,
        }
    }

    /// Replaces the fetcher
    pub fn with_fetcher(mut self, fetcher: RepositoryFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Parses, clones and analyzes the repository at `url`
    ///
    /// The checkout is removed before returning, whatever the outcome.
    #[instrument(skip(self))]
    pub async fn analyze(&self, url: &str) -> Result<RepositoryAnalysis> {
        let reference = RepositoryReference::parse(url)?;
        let checkout = self.fetcher.fetch(reference.clone_url()).await?;

        let analysis = self
            .analyze_path(&reference, checkout.path().to_path_buf())
            .await;
        checkout.close();
        analysis
    }

    /// Analyzes an existing working tree
    pub async fn analyze_path(
        &self,
        reference: &RepositoryReference,
        root: PathBuf,
    ) -> Result<RepositoryAnalysis> {
        let selector = self.selector.clone();
        let files = tokio::task::spawn_blocking(move || selector.select(&root))
            .await
            .map_err(|e| DocError::IO(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        info!(repository = %reference, files = files.len(), "Analyzed repository");
        Ok(RepositoryAnalysis::new(reference, files))
    }

    /// The text sent to the `github_repo` prompt for `analysis`
    pub fn digest(&self, analysis: &RepositoryAnalysis) -> String {
        analysis.digest(self.sample_files, self.sample_chars)
    }
}
