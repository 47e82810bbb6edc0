//! HTTP Client für die Token-API
//!
//! Holt für eine Organisation und einen Use-Case die Room-URL und
//! den Access-Token, mit denen sich der Session Client verbindet.

use super::messages::{ConnectOptions, TokenEndpoint, WebcallTokenRequest};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum TokenError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Failed to get access token: HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Token request failed: {0}")]
    Request(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Invalid token host: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// TOKEN PROVIDER
// ============================================================================

/// Quelle für Room-Zugangsdaten
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Holt URL und Token für einen Use-Case einer Organisation
    async fn fetch_token(
        &self,
        organization_id: &str,
        use_case_id: &str,
    ) -> Result<ConnectOptions, TokenError>;
}

/// Token-Provider über die HTTP-API des Backends
pub struct HttpTokenProvider {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    endpoint: TokenEndpoint,
    call_data: Map<String, Value>,
}

impl HttpTokenProvider {
    /// Erstellt einen neuen Provider für den angegebenen Host
    pub fn new(
        host: &str,
        api_key: Option<String>,
        endpoint: TokenEndpoint,
        call_data: Map<String, Value>,
    ) -> Result<Self, TokenError> {
        let base_url = Url::parse(host).map_err(|e| TokenError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(TokenError::InvalidUrl(host.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            endpoint,
            call_data,
        })
    }

    /// Baut die URL des konfigurierten Endpoints
    fn endpoint_url(&self, use_case_id: &str) -> Result<Url, TokenError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TokenError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            match self.endpoint {
                TokenEndpoint::WebcallTokens => {
                    segments.extend(["api", "webcall-tokens"]);
                }
                TokenEndpoint::UseCaseToken => {
                    segments.extend(["api", "token", use_case_id]);
                }
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(
        &self,
        organization_id: &str,
        use_case_id: &str,
    ) -> Result<ConnectOptions, TokenError> {
        let api_key = self.api_key.as_deref().ok_or(TokenError::MissingApiKey)?;
        let url = self.endpoint_url(use_case_id)?;

        tracing::info!(
            "Requesting call token: {} (organization {}, use case {})",
            url,
            organization_id,
            use_case_id
        );

        // `json()` setzt den Content-Type bereits selbst
        let request = match self.endpoint {
            TokenEndpoint::WebcallTokens => self.http.post(url).json(&WebcallTokenRequest {
                use_case_id,
                data: &self.call_data,
            }),
            TokenEndpoint::UseCaseToken => self
                .http
                .get(url)
                .header(CONTENT_TYPE, "application/json"),
        };

        let response = request
            .header("x-organization-id", organization_id)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| TokenError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Token request rejected with {}: {}", status, body);
            return Err(TokenError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let options = response
            .json::<ConnectOptions>()
            .await
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Received call token for room {}", options.url);
        Ok(options)
    }
}

impl std::fmt::Debug for HttpTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenProvider")
            .field("base_url", &self.base_url.as_str())
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}
