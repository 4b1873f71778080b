use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DocumentationBackend, GenerationResponse};
use crate::config::{ApiKeys, LlmConfig};
use crate::error::{DocError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Backend for the Gemini `generateContent` REST endpoint
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiBackend {
    /// Creates a backend for the configured model
    ///
    /// A missing API key is accepted here; requests then fail at the API.
    pub fn new(config: &LlmConfig, keys: &ApiKeys) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        if keys.gemini().is_none() {
            warn!("GEMINI_API_KEY is not set; documentation requests will fail");
        }

        Ok(Self {
            client,
            endpoint,
            api_key: keys.gemini().map(str::to_string),
        })
    }

    /// The URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentationBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResponse> {
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, "Gemini responded");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => match envelope.error.status {
                    Some(code) => format!("{} ({}): {}", status, code, envelope.error.message),
                    None => format!("{}: {}", status, envelope.error.message),
                },
                Err(_) => format!("{}: {}", status, text.trim()),
            };
            return Err(DocError::Generation {
                message,
                transient: is_transient_status(status),
            });
        }

        Ok(response.json::<GenerationResponse>().await?)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer, key: Option<&str>) -> GeminiBackend {
        let config = LlmConfig {
            base_url: server.uri(),
            model: "gemini-test".to_string(),
            ..LlmConfig::default()
        };
        let keys = ApiKeys {
            gemini_api_key: key.map(str::to_string),
        };
        GeminiBackend::new(&config, &keys).unwrap()
    }

    #[tokio::test]
    async fn posts_prompt_and_parses_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "a"}, {"text": "b"}]},
                     "finishReason": "STOP"},
                    {"finishReason": "SAFETY"}
                ],
                "usageMetadata": {"promptTokenCount": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend(&server, Some("test-key")).generate("hello").await.unwrap();
        assert_eq!(response.candidates.len(), 2);
        assert_eq!(response.texts().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(response.candidates[1].content, None);
    }

    #[tokio::test]
    async fn api_errors_carry_message_and_transience() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = backend(&server, None).generate("hello").await.unwrap_err();
        match err {
            DocError::Generation { message, transient } => {
                assert!(message.contains("API key not valid."));
                assert!(message.contains("INVALID_ARGUMENT"));
                assert!(!transient);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn overload_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = backend(&server, Some("k")).generate("hello").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn endpoint_includes_model() {
        let config = LlmConfig {
            base_url: "https://example.test/".to_string(),
            model: "m".to_string(),
            ..LlmConfig::default()
        };
        let backend = GeminiBackend::new(&config, &ApiKeys::default()).unwrap();
        assert_eq!(backend.endpoint(), "https://example.test/v1beta/models/m:generateContent");
    }
}
