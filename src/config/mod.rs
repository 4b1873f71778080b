mod env_manager;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocError, Result};

pub use env_manager::{get_env_value, ApiKeys};

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "DOCGEN_CONFIG";

/// Main configuration struct for the application
///
/// This structure holds all configuration settings including the API key for
/// the documentation backend, ingestion limits and HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API keys for the documentation backend
    pub api_keys: ApiKeys,
    /// LLM backend settings
    pub llm: LlmConfig,
    /// Repository ingestion limits
    pub analysis: AnalysisConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

/// Settings for the generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name passed to the `generateContent` endpoint
    pub model: String,
    /// Base URL of the generation API
    pub base_url: String,
    /// Deadline for a single generation call
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retries on transient backend failures
    pub max_retries: u32,
    /// Base delay between retries, multiplied by the attempt number
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,
}

/// Limits applied while ingesting a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum number of files collected from a checkout
    pub max_files: usize,
    /// Maximum characters kept per file
    pub max_file_chars: usize,
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
    /// Number of files quoted as code samples in the prompt
    pub sample_files: usize,
    /// Characters quoted per code sample
    pub sample_chars: usize,
    /// Deadline for `git clone`
    #[serde(with = "duration_secs")]
    pub clone_timeout: Duration,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on
    pub bind_addr: SocketAddr,
    /// Directory uploaded files are written to
    pub uploads_dir: PathBuf,
    /// Include error source chains in client-visible error bodies
    pub expose_error_details: bool,
    /// Largest request body accepted, in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Creates a new configuration with the specified uploads directory
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self {
            api_keys: ApiKeys::default(),
            llm: LlmConfig::default(),
            analysis: AnalysisConfig::default(),
            server: ServerConfig {
                uploads_dir,
                ..ServerConfig::default()
            },
            log_level: "info".to_string(),
        }
    }

    /// Loads configuration from the config file (if any) and the environment
    ///
    /// The file is taken from `DOCGEN_CONFIG` or the default config file
    /// location. A missing file is not an error; environment variables are
    /// applied on top of whatever was loaded.
    pub fn load() -> Result<Self> {
        let path = get_env_value(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docgenservice").join("config.toml"))
    }

    /// Parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DocError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            DocError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Overlays settings from environment variables
    pub fn apply_env(&mut self) {
        self.api_keys.apply_env();

        if let Some(model) = get_env_value("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = get_env_value("GEMINI_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(secs) = env_parse::<u64>("DOCGEN_GENERATION_TIMEOUT_SECS") {
            self.llm.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("DOCGEN_CLONE_TIMEOUT_SECS") {
            self.analysis.clone_timeout = Duration::from_secs(secs);
        }
        if let Some(addr) = env_parse::<SocketAddr>("DOCGEN_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(dir) = get_env_value("DOCGEN_UPLOADS_DIR") {
            self.server.uploads_dir = PathBuf::from(dir);
        }
        if let Some(expose) = env_parse::<bool>("DOCGEN_EXPOSE_ERROR_DETAILS") {
            self.server.expose_error_details = expose;
        }
        if let Some(bytes) = env_parse::<usize>("DOCGEN_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = bytes;
        }
    }

    /// Ensures all directories required by the application exist
    pub async fn ensure_directories_exist(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.server.uploads_dir).await?;
        Ok(())
    }

    /// Validates the configured limits
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_files == 0 {
            return Err(DocError::Config("analysis.max_files must be at least 1".into()));
        }
        if self.analysis.max_file_chars == 0 {
            return Err(DocError::Config("analysis.max_file_chars must be at least 1".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(DocError::Config("llm.model must not be empty".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = get_env_value(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring unparsable environment variable");
            None
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(300),
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_file_chars: 5000,
            max_file_bytes: 100_000,
            sample_files: 5,
            sample_chars: 1000,
            clone_timeout: Duration::from_secs(120),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            uploads_dir: PathBuf::from("uploads"),
            expose_error_details: false,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("uploads"))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_directories_exist() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let uploads = temp_dir.path().join("nested").join("uploads");
        let config = Config::new(uploads.clone());

        config.ensure_directories_exist().await?;
        assert!(uploads.is_dir());
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.analysis.max_files, 20);
        assert_eq!(config.analysis.max_file_chars, 5000);
        assert_eq!(config.analysis.max_file_bytes, 100_000);
        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert!(!config.server.expose_error_details);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
log_level = "debug"

[analysis]
max_files = 5
clone_timeout = 30

[server]
expose_error_details = true
"#,
        )?;

        let config = Config::from_file(&path)?;
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.analysis.max_files, 5);
        assert_eq!(config.analysis.max_file_chars, 5000);
        assert_eq!(config.analysis.clone_timeout, Duration::from_secs(30));
        assert!(config.server.expose_error_details);
        Ok(())
    }

    #[test]
    fn test_from_file_rejects_garbage() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "analysis = 12")?;

        assert!(matches!(Config::from_file(&path), Err(DocError::Config(_))));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.analysis.max_files = 0;
        assert!(config.validate().is_err());
    }
}
