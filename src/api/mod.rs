//! HTTP interface: request handlers, shared state and the router.

use std::path::Path;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::analyzer::{RepositoryAnalysis, RepositoryAnalyzer};
use crate::config::Config;
use crate::error::{DocError, ErrorKind, Result};
use crate::llm::{DocumentationBackend, DocumentationClient, GeminiBackend};
use crate::pdf;
use crate::prompts::ContentType;
use crate::utils::{normalize_url, sanitize_filename};

mod form;

pub use form::FormFields;

/// Message returned for every stored upload
pub const UPLOAD_SUCCESS: &str = "File uploaded successfully.";
/// Soft error reported when an uploaded PDF yields no text
pub const PDF_EXTRACTION_FAILED: &str = "Could not extract text from PDF.";
/// Error for a blank `github_url`
pub const NO_GITHUB_URL: &str = "No GitHub URL provided.";
/// Error for a blank `code_snippet`
pub const NO_CODE_SNIPPET: &str = "No code snippet provided.";
/// Error returned when a repository cannot be cloned or read
pub const ANALYSIS_FAILED: &str =
    "Could not analyze repository. Please check the URL and make sure the repository is public.";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    docs: DocumentationClient,
    analyzer: Arc<RepositoryAnalyzer>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds the state with the Gemini backend
    pub fn new(config: Config) -> Result<Self> {
        let backend = GeminiBackend::new(&config.llm, &config.api_keys)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Builds the state around an arbitrary documentation backend
    pub fn with_backend(config: Config, backend: Arc<dyn DocumentationBackend>) -> Self {
        let docs = DocumentationClient::new(backend, &config.llm);
        let analyzer = RepositoryAnalyzer::from_config(&config.analysis);
        Self::from_parts(config, docs, analyzer)
    }

    /// Builds the state from fully constructed components
    pub fn from_parts(
        config: Config,
        docs: DocumentationClient,
        analyzer: RepositoryAnalyzer,
    ) -> Self {
        Self {
            config: Arc::new(config),
            docs,
            analyzer: Arc::new(analyzer),
            started_at: Utc::now(),
        }
    }

    /// The configuration the server runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn fail(&self, status: StatusCode, message: impl Into<String>, err: &DocError) -> ApiError {
        let message = message.into();
        error!(status = %status, error = %err.chain(), "{}", message);
        let api_error = ApiError::new(status, message);
        if self.config.server.expose_error_details {
            api_error.with_details(err.chain())
        } else {
            api_error
        }
    }
}

/// Error body shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Error source chain, only when exposing details is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Creates an error response
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                details: None,
            },
        }
    }

    /// A 400 response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Attaches diagnostic details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    /// Replaces the status code
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Status code of the response
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Response of `POST /generate`
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The snippet as received
    pub code_snippet: String,
    /// Generated documentation
    pub documentation: String,
}

/// Response of `POST /upload`
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Name the file was stored under
    pub filename: String,
    /// Status message
    pub message: String,
    /// Documentation generated from a PDF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Soft error when a PDF could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /analyze-github`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// URL as submitted
    pub github_url: String,
    /// Files and metadata collected from the repository
    pub repository_analysis: RepositoryAnalysis,
    /// Generated documentation
    pub documentation: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Documentation backend in use
    pub backend: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/upload", post(upload_file))
        .route("/analyze-github", post(analyze_github))
        .route("/generate", post(generate))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Landing page
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "healthy".to_string(),
        backend: state.docs.backend_name().to_string(),
        timestamp: now,
        uptime: (now - state.started_at).num_seconds().max(0) as u64,
    })
}

/// Generate documentation for a code snippet
async fn generate(
    State(state): State<AppState>,
    fields: std::result::Result<FormFields, ApiError>,
) -> std::result::Result<Json<GenerateResponse>, ApiError> {
    // Every failure on this endpoint, unreadable bodies included, is a 500.
    let mut fields = fields.map_err(|e| e.with_status(StatusCode::INTERNAL_SERVER_ERROR))?;
    let code_snippet = fields.take("code_snippet").unwrap_or_default();
    if code_snippet.trim().is_empty() {
        let err = DocError::validation(NO_CODE_SNIPPET);
        return Err(state.fail(StatusCode::INTERNAL_SERVER_ERROR, NO_CODE_SNIPPET, &err));
    }

    info!(chars = code_snippet.len(), "Received code snippet for documentation generation");

    let documentation = state
        .docs
        .generate(ContentType::Code, &code_snippet)
        .await
        .map_err(|e| state.fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), &e))?;

    Ok(Json(GenerateResponse {
        code_snippet,
        documentation,
    }))
}

/// Clone a GitHub repository and document it
async fn analyze_github(
    State(state): State<AppState>,
    fields: FormFields,
) -> std::result::Result<Json<AnalyzeResponse>, ApiError> {
    let github_url = normalize_url(fields.get("github_url").unwrap_or_default());
    if github_url.is_empty() {
        return Err(ApiError::bad_request(NO_GITHUB_URL));
    }

    info!(github_url = %github_url, "Analyzing repository");

    let analysis = state.analyzer.analyze(&github_url).await.map_err(|e| {
        let (status, message) = match e.kind() {
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, format!("Invalid GitHub URL: {}", e)),
            ErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, format!("{} ({})", ANALYSIS_FAILED, e)),
            ErrorKind::Fetch => (StatusCode::BAD_GATEWAY, ANALYSIS_FAILED.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED.to_string()),
        };
        state.fail(status, message, &e)
    })?;

    let digest = state.analyzer.digest(&analysis);
    let documentation = state
        .docs
        .generate_or_message(ContentType::GithubRepo, &digest)
        .await;

    Ok(Json(AnalyzeResponse {
        github_url,
        repository_analysis: analysis,
        documentation,
    }))
}

/// Store an uploaded file; document it when it is a PDF
async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "Rejected upload body");
        ApiError::bad_request(format!("Invalid multipart body: {}", e))
    })?;

    let (original_name, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
            .ok_or_else(|| ApiError::bad_request("No file provided."))?;

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name().map_or(false, |name| name != "file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        break (file_name, bytes);
    };

    let filename = sanitize_filename(&original_name)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid filename: {:?}", original_name)))?;

    let location = state.config.server.uploads_dir.join(&filename);
    store_upload(&location, &bytes).await.map_err(|e| {
        state.fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to store upload: {}", e), &e)
    })?;
    info!(filename = %filename, bytes = bytes.len(), path = %location.display(), "Stored upload");

    let mut response = UploadResponse {
        filename: filename.clone(),
        message: UPLOAD_SUCCESS.to_string(),
        documentation: None,
        error: None,
    };

    if pdf::is_pdf_file(&filename) {
        match pdf::extract_text(bytes.to_vec()).await {
            Ok(text) => {
                response.documentation =
                    Some(state.docs.generate_or_message(ContentType::Pdf, &text).await);
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "Error extracting text from PDF");
                response.error = Some(PDF_EXTRACTION_FAILED.to_string());
            }
        }
    }

    Ok(Json(response))
}

async fn store_upload(location: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = location.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(location, bytes).await?;
    Ok(())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Documentation Generator</title>
</head>
<body>
    <h1>Documentation Generator</h1>

    <h2>Code snippet</h2>
    <form action="/generate" method="post">
        <textarea name="code_snippet" rows="12" cols="80"></textarea><br>
        <button type="submit">Generate</button>
    </form>

    <h2>GitHub repository</h2>
    <form action="/analyze-github" method="post">
        <input type="url" name="github_url" size="60" placeholder="https://github.com/owner/repo">
        <button type="submit">Analyze</button>
    </form>

    <h2>Upload a file</h2>
    <form action="/upload" method="post" enctype="multipart/form-data">
        <input type="file" name="file">
        <button type="submit">Upload</button>
    </form>
</body>
</html>
"#;
