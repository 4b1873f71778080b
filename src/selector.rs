//! Selection of source files from a checkout.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::AnalysisConfig;

/// Source and markup extensions considered for documentation
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".java", ".cpp", ".c", ".cs", ".php",
    ".rb", ".go", ".rs", ".swift", ".kt", ".scala", ".r", ".m",
    ".html", ".css", ".vue", ".jsx", ".tsx",
];

/// Tooling, dependency and build output directories that are never entered
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules", ".git", "__pycache__", ".pytest_cache",
    "venv", "env", ".venv", "build", "dist", "target",
    ".next", ".nuxt", "coverage", ".nyc_output",
];

/// A file picked from a checkout, with its content cut to the configured cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFile {
    /// Path relative to the checkout root, `/`-separated
    pub path: String,
    /// File content, at most `max_file_chars` characters
    pub content: String,
    /// Extension including the leading dot
    pub extension: String,
    /// Whether `content` was cut short
    pub truncated: bool,
}

/// Text that may have been shortened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    /// The retained text
    pub text: String,
    /// Whether anything was dropped
    pub truncated: bool,
}

/// Keeps the first `max_chars` characters of `text`
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> Truncated {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Truncated {
            text: text[..cut].to_string(),
            truncated: true,
        },
        None => Truncated {
            text: text.to_string(),
            truncated: false,
        },
    }
}

/// Returns the extension of `path` with a leading dot, if it has one
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
}

/// Whether `extension` (with leading dot) is on the allow-list
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}

/// Whether any component of `relative` is a deny-listed directory
pub fn is_in_excluded_dir(relative: &Path) -> bool {
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map_or(false, |part| EXCLUDED_DIRS.contains(&part))
    })
}

/// Walks a checkout and collects a bounded list of source files
#[derive(Debug, Clone)]
pub struct FileSelector {
    max_files: usize,
    max_file_chars: usize,
    max_file_bytes: u64,
}

impl FileSelector {
    /// Creates a selector with explicit limits
    pub fn new(max_files: usize, max_file_chars: usize, max_file_bytes: u64) -> Self {
        Self {
            max_files,
            max_file_chars,
            max_file_bytes,
        }
    }

    /// Creates a selector from the analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.max_files, config.max_file_chars, config.max_file_bytes)
    }

    /// Collects files under `root` in walk order, stopping at the cap
    ///
    /// Unreadable entries are logged and skipped; the walk itself never fails.
    pub fn select(&self, root: &Path) -> Vec<ExtractedFile> {
        let mut files = Vec::new();
        if self.max_files == 0 {
            return files;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded_dir_entry(entry, root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(file) = self.extract(root, &entry) {
                files.push(file);
                if files.len() >= self.max_files {
                    debug!(max_files = self.max_files, "File cap reached");
                    break;
                }
            }
        }

        files
    }

    fn extract(&self, root: &Path, entry: &DirEntry) -> Option<ExtractedFile> {
        let path = entry.path();
        let extension = dotted_extension(path)?;
        if !is_supported_extension(&extension) {
            return None;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if is_in_excluded_dir(relative) {
            return None;
        }

        match entry.metadata() {
            Ok(metadata) if metadata.len() <= self.max_file_bytes => {}
            Ok(metadata) => {
                debug!(path = %relative.display(), size = metadata.len(), "Skipping large file");
                return None;
            }
            Err(e) => {
                debug!(path = %relative.display(), error = %e, "Skipping file without metadata");
                return None;
            }
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error reading file");
                return None;
            }
        };
        let content = decode_lossy(&bytes);
        if content.trim().is_empty() {
            return None;
        }

        let Truncated { text, truncated } = truncate_chars(&content, self.max_file_chars);
        Some(ExtractedFile {
            path: relative_path_string(relative),
            content: text,
            extension,
            truncated,
        })
    }
}

impl Default for FileSelector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

fn is_excluded_dir_entry(entry: &DirEntry, root: &Path) -> bool {
    entry.file_type().is_dir()
        && entry.path() != root
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| EXCLUDED_DIRS.contains(&name))
}

/// Decodes UTF-8, dropping invalid byte sequences
fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

fn relative_path_string(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
