//! unologin-auth
//!
//! Token verification and session cookies for apps that log users in through
//! unologin.
//!
//! - **Verifying login tokens**, either by asking the provider
//!   ([`ProviderVerifier`]) or locally against a trusted key or JWKS
//!   ([`KeyVerifier`])
//! - **Building the login cookie pair** and parsing `Cookie` headers
//!   ([`LoginCookies`], [`parse_cookie_header`])
//!
//! ## Quick start
//! ```no_run
//! use unologin_auth::build_verifier;
//! use unologin_core::{Realm, UnologinConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UnologinConfig::new("my-api-key", Realm::default());
//! let verifier = build_verifier(&config)?;
//! let login = verifier.verify("eyJ...").await?;
//! println!("asuId={}", login.payload.asu_id);
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]

mod claims;
mod cookie;
mod error;
mod jwt;
#[cfg(feature = "fetch-reqwest")]
mod provider;

pub use cookie::{
    LOGIN_STATE_COOKIE, LOGIN_STATE_SUCCESS, LOGIN_TOKEN_COOKIE, LoginCookies, login_token,
    parse_cookie_header,
};
pub use error::{Error, Result};
pub use jwt::{Jwk, JwksSet, JwksSource, KeySource, KeyVerifier, VerifyOptions};
#[cfg(feature = "fetch-reqwest")]
pub use provider::{API_KEY_HEADER, ProviderVerifier};

use std::sync::Arc;
use std::time::Duration;
use unologin_api::TokenVerifier;
use unologin_core::{UnologinConfig, VerificationMode};

/// Pick the verifier the configuration asks for.
///
/// # Errors
///
/// Fails when key material is unusable, or when provider mode is requested
/// without the `fetch-reqwest` feature.
pub fn build_verifier(config: &UnologinConfig) -> Result<Arc<dyn TokenVerifier>> {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    match &config.verification {
        VerificationMode::Key(settings) => Ok(Arc::new(KeyVerifier::from_settings(
            settings,
            config.app_id(),
            timeout,
        )?)),
        #[cfg(feature = "fetch-reqwest")]
        VerificationMode::Provider => Ok(Arc::new(ProviderVerifier::new(config)?)),
        #[cfg(not(feature = "fetch-reqwest"))]
        VerificationMode::Provider => Err(Error::Config(
            "provider verification requires the fetch-reqwest feature".to_string(),
        )),
    }
}
