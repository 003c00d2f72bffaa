//! Login-token verification through the provider's HTTP API.

use crate::Result;
use crate::claims::TokenClaims;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use unologin_api::{TokenVerifier, VerifiedLogin, VerifyError};
use unologin_core::UnologinConfig;

/// Header carrying the app's API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

const VERIFY_PATH: &str = "/apps/this/verifyLoginToken";

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
}

/// Asks the provider to vouch for every token.
#[derive(Debug, Clone)]
pub struct ProviderVerifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    app_id: Option<String>,
}

impl ProviderVerifier {
    /// Build a verifier with its own HTTP client, honouring
    /// `request_timeout_ms`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(config: &UnologinConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build a verifier around a caller supplied client (proxies, custom TLS).
    pub fn with_client(config: &UnologinConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{VERIFY_PATH}", config.realm.api_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            app_id: config.app_id(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenVerifier for ProviderVerifier {
    async fn verify(&self, token: &str) -> std::result::Result<VerifiedLogin, VerifyError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "identity provider request failed");
                VerifyError::Network(e.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            let claims: TokenClaims = resp.json().await.map_err(|e| {
                warn!(error = %e, "identity provider sent an unreadable payload");
                VerifyError::Malformed
            })?;
            let verified = claims.into_verified(self.app_id.as_deref())?;
            debug!(asu_id = %verified.payload.asu_id, "login token verified by provider");
            return Ok(verified);
        }

        let body = resp.json::<ProviderErrorBody>().await.ok();
        let msg = body
            .and_then(|b| b.msg.or(b.message))
            .filter(|m| !m.trim().is_empty());

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(VerifyError::Rejected(
                    msg.unwrap_or_else(|| VerifyError::InvalidToken.to_string()),
                ))
            }
            _ => {
                warn!(%status, "identity provider failed to verify token");
                Err(VerifyError::Network(format!("provider returned {status}")))
            }
        }
    }
}
