#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docgenservice::error::{DocError, Result};
use docgenservice::{
    router, AppState, Config, DocumentationBackend, DocumentationClient, GenerationResponse,
    RepositoryAnalyzer, RepositoryFetcher,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub mod test_helpers {
    use super::*;

    /// A backend that answers every prompt with a fixed reply, or fails
    pub struct StubBackend {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubBackend {
        pub fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentationBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate(&self, prompt: &str) -> Result<GenerationResponse> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(reply) => Ok(GenerationResponse::from_texts(vec![vec![reply.clone()]])),
                None => Err(DocError::generation("backend unavailable")),
            }
        }
    }

    /// Everything a router test needs; the temp dir lives as long as this does
    pub struct TestApp {
        pub router: Router,
        pub backend: Arc<StubBackend>,
        pub uploads_dir: PathBuf,
        _dir: TempDir,
    }

    pub fn create_test_config(dir: &Path) -> Config {
        let mut config = Config::new(dir.join("uploads"));
        config.llm.max_retries = 0;
        config.llm.retry_delay = Duration::from_millis(1);
        config.llm.timeout = Duration::from_secs(5);
        config.analysis.clone_timeout = Duration::from_secs(5);
        config
    }

    /// Builds an app whose repository fetcher runs `git`
    pub fn test_app_with(
        backend: Arc<StubBackend>,
        git: impl Into<PathBuf>,
        customize: impl FnOnce(&mut Config),
    ) -> TestApp {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(dir.path());
        customize(&mut config);

        let uploads_dir = config.server.uploads_dir.clone();
        let docs = DocumentationClient::new(backend.clone(), &config.llm);
        let analyzer = RepositoryAnalyzer::from_config(&config.analysis).with_fetcher(
            RepositoryFetcher::new(config.analysis.clone_timeout).with_git_binary(git),
        );
        let state = AppState::from_parts(config, docs, analyzer);

        TestApp {
            router: router(state),
            backend,
            uploads_dir,
            _dir: dir,
        }
    }

    /// Builds an app that can never reach a real git remote
    pub fn test_app(backend: Arc<StubBackend>) -> TestApp {
        test_app_with(backend, "/nonexistent/bin/git-for-tests", |_| {})
    }

    /// Writes an executable shell script standing in for `git`
    #[cfg(unix)]
    pub fn fake_git(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-git");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A one-page PDF showing `text` in Helvetica, with a correct xref table
    pub fn single_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
             /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
        }

        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        pdf
    }

    pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub const BOUNDARY: &str = "docgen-test-boundary";

    /// A multipart body with a single file part
    pub fn multipart_file(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        multipart_request(uri, body)
    }

    /// A multipart body with text fields only
    pub fn multipart_fields(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        multipart_request(uri, body.into_bytes())
    }

    fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }
}
