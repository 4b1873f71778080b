use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, DocError>;

/// Errors that can occur while ingesting content or generating documentation
#[derive(Debug, Error)]
pub enum DocError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal errors
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A repository URL that does not name an owner and a repository
    #[error("Invalid repository reference: {0}")]
    InvalidReference(String),

    /// Cloning the repository failed (network, auth, missing repository)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A clone or generation call exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that was cut off
        operation: &'static str,
        /// The deadline that expired
        after: Duration,
    },

    /// Documentation backend errors
    #[error("Generation error: {message}")]
    Generation {
        /// Message reported by the backend
        message: String,
        /// Whether retrying the request may succeed
        transient: bool,
    },

    /// PDF text extraction errors
    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification used at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable
    InvalidInput,
    /// The repository could not be fetched
    Fetch,
    /// A deadline expired
    Timeout,
    /// The documentation backend failed
    Generation,
    /// Anything else
    Internal,
}

impl DocError {
    /// Creates a validation error with the specified message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a generation error that is not worth retrying
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            transient: false,
        }
    }

    /// Returns the coarse kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidReference(_) | Self::Validation(_) | Self::UrlParse(_) => {
                ErrorKind::InvalidInput
            }
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Generation { .. } | Self::Http(_) | Self::Json(_) => ErrorKind::Generation,
            Self::IO(_) | Self::Walkdir(_) | Self::PdfExtraction(_) | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Checks if this error is transient and retryable
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Generation { transient, .. } => *transient,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Renders the error together with its source chain, one cause per line
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
