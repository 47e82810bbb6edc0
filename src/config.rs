//! Konfiguration aus Umgebungsvariablen
//!
//! Alle Werte haben einen Default, damit die App auch ohne `.env` startet.
//! Der API-Key ist optional: ohne Key schlägt nur der Start-Pfad fehl,
//! Join-Links funktionieren weiterhin.

use crate::token::TokenEndpoint;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Standard-Host der Token-API
pub const DEFAULT_HOST: &str = "https://v2.platform.happyrobot.ai";

/// Platzhalter bis eine echte Organisation konfiguriert ist
pub const DEFAULT_ORGANIZATION_ID: &str = "YOUR_ORG_ID";

/// Platzhalter bis ein echter Use-Case konfiguriert ist
pub const DEFAULT_USE_CASE_ID: &str = "YOUR_USE_CASE_ID";

/// Startseite, wenn keine Page-URL angegeben wurde
pub const DEFAULT_PAGE_URL: &str = "http://localhost/";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("WEBCALL_CALL_DATA must be a JSON object: {0}")]
    InvalidCallData(String),

    #[error("Unknown token endpoint '{0}' (expected 'webcall-tokens' or 'token')")]
    InvalidTokenEndpoint(String),

    #[error("Invalid page URL: {0}")]
    InvalidPageUrl(String),
}

// ============================================================================
// CONFIG
// ============================================================================

/// Laufzeit-Konfiguration der App
#[derive(Debug, Clone)]
pub struct WebCallConfig {
    pub api_key: Option<String>,
    pub host: String,
    pub organization_id: String,
    pub use_case_id: String,
    pub token_endpoint: TokenEndpoint,
    /// Parameter für den Webcall-Node des Workflows
    pub call_data: Map<String, Value>,
    pub page_url: Url,
}

impl WebCallConfig {
    /// Liest die Konfiguration aus der Prozess-Umgebung
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Liest die Konfiguration über eine beliebige Lookup-Funktion
    ///
    /// Leere Werte zählen als nicht gesetzt.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };

        let token_endpoint = match get(&["WEBCALL_TOKEN_ENDPOINT"]) {
            Some(raw) => raw
                .parse::<TokenEndpoint>()
                .map_err(|_| ConfigError::InvalidTokenEndpoint(raw))?,
            None => TokenEndpoint::default(),
        };

        let call_data = match get(&["WEBCALL_CALL_DATA"]) {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(other) => return Err(ConfigError::InvalidCallData(other.to_string())),
                Err(e) => return Err(ConfigError::InvalidCallData(e.to_string())),
            },
            None => default_call_data(),
        };

        let page_url = get(&["WEBCALL_PAGE_URL"]).unwrap_or_else(|| DEFAULT_PAGE_URL.to_string());
        let page_url = Url::parse(&page_url).map_err(|e| ConfigError::InvalidPageUrl(e.to_string()))?;

        Ok(Self {
            api_key: get(&["HAPPYROBOT_API_KEY", "VITE_HAPPYROBOT_API_KEY"]),
            host: get(&["HAPPYROBOT_URL", "VITE_HAPPYROBOT_URL"])
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            organization_id: get(&["WEBCALL_ORGANIZATION_ID"])
                .unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string()),
            use_case_id: get(&["WEBCALL_USE_CASE_ID"])
                .unwrap_or_else(|| DEFAULT_USE_CASE_ID.to_string()),
            token_endpoint,
            call_data,
            page_url,
        })
    }

    /// Ersetzt die Page-URL (z.B. aus einem CLI-Argument)
    pub fn with_page_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.page_url = Url::parse(raw).map_err(|e| ConfigError::InvalidPageUrl(e.to_string()))?;
        Ok(self)
    }
}

/// Default-Payload für den Webcall-Node
pub fn default_call_data() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("name".to_string(), Value::String("John Doe".to_string()));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WebCallConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.organization_id, DEFAULT_ORGANIZATION_ID);
        assert_eq!(config.use_case_id, DEFAULT_USE_CASE_ID);
        assert_eq!(config.token_endpoint, TokenEndpoint::WebcallTokens);
        assert_eq!(config.call_data.get("name"), Some(&Value::from("John Doe")));
        assert_eq!(config.page_url.path(), "/");
    }

    #[test]
    fn test_vite_fallback_and_empty_values() {
        let config = WebCallConfig::from_lookup(lookup(&[
            ("HAPPYROBOT_API_KEY", "  "),
            ("VITE_HAPPYROBOT_API_KEY", "secret"),
            ("VITE_HAPPYROBOT_URL", "http://localhost:8080"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.host, "http://localhost:8080");
    }

    #[test]
    fn test_overrides() {
        let config = WebCallConfig::from_lookup(lookup(&[
            ("WEBCALL_ORGANIZATION_ID", "org-1"),
            ("WEBCALL_USE_CASE_ID", "uc-1"),
            ("WEBCALL_TOKEN_ENDPOINT", "token"),
            ("WEBCALL_CALL_DATA", r#"{"email":"john.doe@example.com"}"#),
            ("WEBCALL_PAGE_URL", "http://localhost/custom?token=t"),
        ]))
        .unwrap();

        assert_eq!(config.organization_id, "org-1");
        assert_eq!(config.use_case_id, "uc-1");
        assert_eq!(config.token_endpoint, TokenEndpoint::UseCaseToken);
        assert!(config.call_data.get("name").is_none());
        assert_eq!(config.page_url.path(), "/custom");
    }

    #[test]
    fn test_invalid_values() {
        let err = WebCallConfig::from_lookup(lookup(&[("WEBCALL_CALL_DATA", "[1,2]")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCallData(_)));

        let err =
            WebCallConfig::from_lookup(lookup(&[("WEBCALL_TOKEN_ENDPOINT", "soap")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokenEndpoint(_)));

        let err = WebCallConfig::from_lookup(lookup(&[])).unwrap().with_page_url("not a url");
        assert!(matches!(err, Err(ConfigError::InvalidPageUrl(_))));
    }
}
