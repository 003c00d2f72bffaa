use std::sync::Arc;

use axum::Router;
use axum::http::request::Parts;
use axum::response::Response;
use axum::routing::post;
use unologin_api::TokenVerifier;
use unologin_auth::LoginCookies;
use unologin_core::UnologinConfig;

use crate::dispatch::{AuthError, AuthErrorHandler, AuthFailure, DefaultAuthErrorHandler};
use crate::handlers::login_event_handler;

struct Inner {
    config: UnologinConfig,
    cookies: LoginCookies,
    verifier: Arc<dyn TokenVerifier>,
    on_auth_error: Arc<dyn AuthErrorHandler>,
}

/// Shared login state handed to every stage as axum `State`.
///
/// Cloning is cheap. The value never changes after construction; swapping the
/// error handler produces a new handle.
#[derive(Clone)]
pub struct Unologin {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Unologin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unologin")
            .field("frontend_url", &self.inner.config.realm.frontend_url)
            .field("cookies", &self.inner.cookies)
            .finish_non_exhaustive()
    }
}

impl Unologin {
    pub fn new(config: UnologinConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        let cookies = LoginCookies::new(config.cookies_domain.clone(), &config.cookies);
        Self {
            inner: Arc::new(Inner {
                config,
                cookies,
                verifier,
                on_auth_error: Arc::new(DefaultAuthErrorHandler),
            }),
        }
    }

    /// Build with the verifier selected by `config.verification`.
    ///
    /// # Errors
    ///
    /// Fails if the verifier cannot be constructed (bad key material, HTTP
    /// client setup).
    pub fn from_config(config: UnologinConfig) -> unologin_auth::Result<Self> {
        let verifier = unologin_auth::build_verifier(&config)?;
        Ok(Self::new(config, verifier))
    }

    /// Replace the error handler. The previous handler is discarded.
    #[must_use]
    pub fn with_error_handler<H>(self, handler: H) -> Self
    where
        H: AuthErrorHandler + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                config: self.inner.config.clone(),
                cookies: self.inner.cookies.clone(),
                verifier: Arc::clone(&self.inner.verifier),
                on_auth_error: Arc::new(handler),
            }),
        }
    }

    /// Closure form of [`Unologin::with_error_handler`].
    #[must_use]
    pub fn on_auth_error<F>(self, handler: F) -> Self
    where
        F: Fn(AuthError<'_>) -> Response + Send + Sync + 'static,
    {
        self.with_error_handler(handler)
    }

    pub fn config(&self) -> &UnologinConfig {
        &self.inner.config
    }

    pub fn cookies(&self) -> &LoginCookies {
        &self.inner.cookies
    }

    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Router serving the login callback on `config.login_path` (POST and GET).
    pub fn login_routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(
                &self.inner.config.login_path,
                post(login_event_handler).get(login_event_handler),
            )
            .with_state(self.clone())
    }

    pub(crate) fn reject(&self, request: &Parts, failure: &AuthFailure) -> Response {
        self.inner
            .on_auth_error
            .handle(AuthError::new(request, failure, &self.inner.cookies))
    }
}
