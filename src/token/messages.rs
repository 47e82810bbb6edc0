//! Message Types für die Token-API
//!
//! Diese Strukturen spiegeln die JSON-Bodies des Backends wider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENDPOINT
// ============================================================================

/// Variante der Token-API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenEndpoint {
    /// `POST /api/webcall-tokens` mit Use-Case und Call-Parametern im Body
    #[default]
    WebcallTokens,
    /// `GET /api/token/{use_case_id}`
    UseCaseToken,
}

impl FromStr for TokenEndpoint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "webcall-tokens" | "webcall_tokens" => Ok(Self::WebcallTokens),
            "token" => Ok(Self::UseCaseToken),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TokenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebcallTokens => f.write_str("webcall-tokens"),
            Self::UseCaseToken => f.write_str("token"),
        }
    }
}

// ============================================================================
// CLIENT → SERVER
// ============================================================================

/// Body für `POST /api/webcall-tokens`
#[derive(Debug, Clone, Serialize)]
pub struct WebcallTokenRequest<'a> {
    pub use_case_id: &'a str,
    /// Parameter, die im Webcall-Node des Workflows definiert sind
    pub data: &'a Map<String, Value>,
}

// ============================================================================
// SERVER → CLIENT
// ============================================================================

/// Verbindungsdaten für einen Room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    #[serde(alias = "roomUrl", alias = "room_url", alias = "liveKitUrl")]
    pub url: String,
    pub token: String,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}
