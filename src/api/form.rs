use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{Form, FromRequest, Json, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;

use super::ApiError;

/// Text fields of a request body, whatever its encoding
///
/// Accepts `application/json` objects, `multipart/form-data` and
/// `application/x-www-form-urlencoded`. File parts of multipart bodies are
/// ignored, as are non-string JSON values other than numbers and booleans.
#[derive(Debug, Default, Clone)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Returns a field's value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Removes and returns a field's value
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }
}

impl From<HashMap<String, String>> for FormFields {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

enum BodyKind {
    Json,
    Multipart,
    UrlEncoded,
}

fn body_kind(req: &Request) -> BodyKind {
    let mime = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    match mime {
        Some(m) if m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON) => BodyKind::Json,
        Some(m) if m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA => {
            BodyKind::Multipart
        }
        _ => BodyKind::UrlEncoded,
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Json => {
                let Json(value) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
                Ok(Self(json_fields(value)))
            }
            BodyKind::Multipart => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?;

                let mut fields = HashMap::new();
                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
                {
                    if field.file_name().is_some() {
                        continue;
                    }
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid form field: {}", e)))?;
                    fields.insert(name, text);
                }
                Ok(Self(fields))
            }
            BodyKind::UrlEncoded => {
                let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid form body: {}", e)))?;
                Ok(Self(fields))
            }
        }
    }
}

fn json_fields(value: Value) -> HashMap<String, String> {
    let Value::Object(map) = value else {
        return HashMap::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect()
}
