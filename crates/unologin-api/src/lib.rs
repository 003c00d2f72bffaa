use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type AsuId = String;
pub type AppId = String;

/// Identity carried by a verified login token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,
    pub asu_id: AsuId,
    #[serde(default)]
    pub user_classes: Vec<String>,
}

impl LoginPayload {
    pub fn has_user_class(&self, class: &str) -> bool {
        self.user_classes.iter().any(|c| c == class)
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLogin {
    pub payload: LoginPayload,
    /// Token expiry, when the token carries one.
    pub expires_at: Option<SystemTime>,
}

impl VerifiedLogin {
    pub fn new(payload: LoginPayload) -> Self {
        Self {
            payload,
            expires_at: None,
        }
    }
}

/// Why a token could not be trusted.
///
/// The `Display` text may carry transport details; use
/// [`VerifyError::public_message`] for anything shown to the browser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid token")]
    InvalidToken,
    #[error("jwt malformed")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("jwt expired")]
    Expired,
    #[error("jwt not active")]
    NotYetValid,
    #[error("token issued for another app")]
    WrongApp,
    #[error("{0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Network(String),
}

impl VerifyError {
    /// Short machine-friendly name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::InvalidToken => "invalid_token",
            VerifyError::Malformed => "malformed",
            VerifyError::InvalidSignature => "invalid_signature",
            VerifyError::Expired => "expired",
            VerifyError::NotYetValid => "not_yet_valid",
            VerifyError::WrongApp => "wrong_app",
            VerifyError::Rejected(_) => "rejected",
            VerifyError::Network(_) => "network",
        }
    }

    /// Text safe to hand to the browser, e.g. in the `msg` parameter of the
    /// failure redirect. Network details stay out of it.
    pub fn public_message(&self) -> String {
        match self {
            VerifyError::Network(_) => "identity provider unreachable".to_string(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedLogin, VerifyError>;
}
