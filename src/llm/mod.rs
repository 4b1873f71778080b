//! Documentation generation through an LLM backend.
//!
//! [`DocumentationClient`] is built once at startup around a
//! [`DocumentationBackend`] and shared read-only by every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LlmConfig;
use crate::error::{DocError, Result};
use crate::prompts::{wrap_with_preamble, ContentType, PromptContext};
use crate::utils::with_retry;

/// Gemini `generateContent` backend
pub mod gemini;

pub use gemini::GeminiBackend;

/// Separator placed between text fragments of a response
pub const FRAGMENT_SEPARATOR: &str = "\n\n---\n\n";

/// Returned when the backend produced no text at all
pub const NO_DOCUMENTATION: &str = "No documentation generated.";

/// A generation response: candidates, each with content parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Alternative completions
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content, absent when the candidate was blocked
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content of a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Ordered parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part; only text parts carry documentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text of the part
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerationResponse {
    /// Builds a response with one candidate per entry, each with the given parts
    pub fn from_texts<I, P, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates
                .into_iter()
                .map(|parts| Candidate {
                    content: Some(Content {
                        parts: parts
                            .into_iter()
                            .map(|text| Part { text: Some(text.into()) })
                            .collect(),
                    }),
                    finish_reason: None,
                })
                .collect(),
        }
    }

    /// All non-empty text fragments in encounter order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// Joins every fragment with [`FRAGMENT_SEPARATOR`], or `None` if there are none
    pub fn joined_text(&self) -> Option<String> {
        let texts: Vec<&str> = self.texts().collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join(FRAGMENT_SEPARATOR))
        }
    }
}

/// A service that turns a prompt into generated text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentationBackend: Send + Sync {
    /// Returns the name of the backend
    fn name(&self) -> &'static str;

    /// Sends a prompt and returns the raw response
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse>;
}

/// Generates documentation for a piece of content
#[derive(Clone)]
pub struct DocumentationClient {
    backend: Arc<dyn DocumentationBackend>,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl DocumentationClient {
    /// Creates a client around `backend` with the configured deadline and retries
    pub fn new(backend: Arc<dyn DocumentationBackend>, config: &LlmConfig) -> Self {
        Self {
            backend,
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Generates documentation, propagating failures
    pub async fn generate(&self, content_type: ContentType, body: &str) -> Result<String> {
        let prompt = wrap_with_preamble(&PromptContext::new(content_type, body).render());
        debug!(
            backend = self.backend.name(),
            content_type = %content_type,
            prompt_chars = prompt.len(),
            "Sending prompt"
        );

        let this = self;
        let prompt_ref = prompt.as_str();
        let response = with_retry(
            move || this.generate_once(prompt_ref),
            self.max_retries,
            self.retry_delay,
            DocError::is_transient,
        )
        .await?;

        let documentation = response
            .joined_text()
            .unwrap_or_else(|| NO_DOCUMENTATION.to_string());
        info!(
            content_type = %content_type,
            candidates = response.candidates.len(),
            chars = documentation.len(),
            "Generated documentation"
        );
        Ok(documentation)
    }

    /// Generates documentation, turning any failure into an error message
    pub async fn generate_or_message(&self, content_type: ContentType, body: &str) -> String {
        match self.generate(content_type, body).await {
            Ok(documentation) => documentation,
            Err(e) => {
                error!(content_type = %content_type, error = %e.chain(), "Documentation generation failed");
                format!("Error generating documentation: {}", e)
            }
        }
    }

    async fn generate_once(&self, prompt: &str) -> Result<GenerationResponse> {
        match tokio::time::timeout(self.timeout, self.backend.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(DocError::Timeout {
                operation: "documentation generation",
                after: self.timeout,
            }),
        }
    }
}
