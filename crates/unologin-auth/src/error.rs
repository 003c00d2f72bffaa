//! Error types.

use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building verifiers or cookies.
///
/// Token verification itself reports [`unologin_api::VerifyError`]; these
/// errors are about setup and local input.
#[derive(Debug, Error)]
pub enum Error {
    /// Key material could not be turned into a decoding key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Algorithm name is unknown or does not fit the key.
    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlg(String),

    /// Unable to fetch, parse, or use a JWKS.
    #[error("JWKS error: {0}")]
    Jwks(String),

    /// A value cannot be placed in a cookie.
    #[error("invalid cookie value for {0}")]
    CookieValue(&'static str),

    /// The configuration asks for something this build cannot do.
    #[error("configuration error: {0}")]
    Config(String),

    /// An error occurred while setting up the HTTP client.
    #[cfg(feature = "fetch-reqwest")]
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// jsonwebtoken error.
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
