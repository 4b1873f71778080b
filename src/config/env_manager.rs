use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Stores API keys for the documentation backend
///
/// The key is read once at startup. Its absence is not validated here: the
/// first generation call fails when the key is missing or invalid.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    /// Gemini API key
    pub gemini_api_key: Option<String>,
}

impl ApiKeys {
    /// Overrides keys with any that are set in the environment
    pub fn apply_env(&mut self) {
        if let Some(key) = get_env_value(GEMINI_API_KEY_ENV) {
            self.gemini_api_key = Some(key);
        }
    }

    /// Returns the Gemini key, if configured
    pub fn gemini(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_key() {
        let keys = ApiKeys {
            gemini_api_key: Some("secret-key".to_string()),
        };
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(get_env_value("DOCGEN_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
