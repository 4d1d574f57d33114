//! Cross-origin policy for browser clients.

use std::env;

use serde::{Deserialize, Serialize};

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
const DEFAULT_HEADERS: &str = "Content-Type,Authorization";

/// CORS policy consumed per route group.
///
/// `"*"` in `allowed_origins` admits any origin. When credentials are allowed
/// the concrete request origin is echoed back instead of `*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsConfig {
    #[serde(rename = "origins")]
    pub allowed_origins: Vec<String>,
    #[serde(rename = "methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_headers", rename = "headers")]
    pub allowed_headers: Vec<String>,
    #[serde(rename = "credentials")]
    pub allow_credentials: bool,
    /// Reject non-preflight requests from unlisted origins with 403 instead of
    /// silently omitting the CORS headers.
    #[serde(default)]
    pub reject_disallowed: bool,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_headers() -> Vec<String> {
    split_list(DEFAULT_HEADERS)
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: split_list(DEFAULT_ORIGINS),
            allowed_methods: split_list(DEFAULT_METHODS),
            allowed_headers: default_headers(),
            allow_credentials: true,
            reject_disallowed: false,
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let allowed_origins = split_list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string()),
        );
        let allowed_methods = split_list(
            &env::var("CORS_ALLOWED_METHODS").unwrap_or_else(|_| DEFAULT_METHODS.to_string()),
        )
        .into_iter()
        .map(|m| m.to_ascii_uppercase())
        .collect();
        let allowed_headers = split_list(
            &env::var("CORS_ALLOWED_HEADERS").unwrap_or_else(|_| DEFAULT_HEADERS.to_string()),
        );

        Self {
            allowed_origins,
            allowed_methods,
            allowed_headers,
            allow_credentials: env::var("CORS_ALLOW_CREDENTIALS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            reject_disallowed: env::var("CORS_REJECT_DISALLOWED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Policy admitting exactly the given origins with default methods and headers.
    pub fn with_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn rejecting_disallowed(mut self) -> Self {
        self.reject_disallowed = true;
        self
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allows_any_origin() || self.allowed_origins.iter().any(|o| o == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = CorsConfig::default();
        assert!(config.is_origin_allowed("http://localhost:3000"));
        assert!(!config.is_origin_allowed("https://evil.example"));
        assert!(config.allowed_methods.contains(&"OPTIONS".to_string()));
        assert!(config.allow_credentials);
        assert!(!config.reject_disallowed);
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let config = CorsConfig::with_origins(["*"]);
        assert!(config.allows_any_origin());
        assert!(config.is_origin_allowed("https://anything.example"));
    }

    #[test]
    fn test_split_list_ignores_blanks() {
        assert_eq!(split_list(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_deserializes_config_surface() {
        let config: CorsConfig = serde_json::from_str(
            r#"{"origins":["https://app.carenet.example"],"methods":["GET"],"credentials":false}"#,
        )
        .unwrap();
        assert_eq!(config.allowed_origins, vec!["https://app.carenet.example"]);
        assert_eq!(config.allowed_methods, vec!["GET"]);
        assert!(!config.allow_credentials);
        assert_eq!(config.allowed_headers, default_headers());
    }
}
