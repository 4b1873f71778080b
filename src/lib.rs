#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! docgenservice - documentation generation for code, PDFs and GitHub repositories
//!
//! This library turns source code into human-readable documentation with a
//! large language model. Content arrives as a code snippet, an uploaded PDF
//! or a public GitHub repository, is wrapped in a content-specific prompt
//! and sent to the configured generation backend.
//!
//! ## Features
//! - Clone public GitHub repositories into temporary checkouts
//! - Select and truncate source files under configurable limits
//! - Extract text from PDF uploads
//! - Generate documentation through the Gemini API, with deadlines and retries
//! - Serve everything over HTTP with axum
//!
//! ## Usage
//! ```rust,ignore
//! use docgenservice::{Config, ContentType, DocumentationClient, GeminiBackend};
//! use std::sync::Arc;
//!
//! async fn example() -> docgenservice::Result<()> {
//!     let config = Config::load()?;
//!     let backend = GeminiBackend::new(&config.llm, &config.api_keys)?;
//!     let client = DocumentationClient::new(Arc::new(backend), &config.llm);
//!
//!     let docs = client.generate(ContentType::Code, "def add(a, b): return a + b").await?;
//!     println!("{}", docs);
//!     Ok(())
//! }
//! ```

/// Repository analysis built from a checkout
pub mod analyzer;
/// HTTP handlers and router
pub mod api;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Documentation generation backends and client
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// PDF text extraction
pub mod pdf;
/// Prompt templates
pub mod prompts;
/// GitHub references and cloning
pub mod repository;
/// Source file selection
pub mod selector;
/// Utilities (path normalization, retry helpers)
pub mod utils;

// Re-export common types
pub use analyzer::{RepositoryAnalysis, RepositoryAnalyzer};
pub use api::{router, AppState};
pub use config::Config;
pub use error::{DocError, ErrorKind, Result};
pub use llm::{DocumentationBackend, DocumentationClient, GeminiBackend, GenerationResponse};
pub use prompts::ContentType;
pub use repository::{RepositoryFetcher, RepositoryReference};
pub use selector::{ExtractedFile, FileSelector};
