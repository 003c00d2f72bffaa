//! Error dispatch for rejected requests.

use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use unologin_api::VerifyError;
use unologin_auth::LoginCookies;

use crate::append_set_cookies;

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// A login cookie was presented but could not be verified.
    #[error("login cookie rejected: {0}")]
    InvalidCookie(VerifyError),
    /// The route requires a login and the request has none.
    #[error("login required")]
    NotLoggedIn,
}

/// Everything an error handler gets to see.
#[derive(Debug, Clone, Copy)]
pub struct AuthError<'a> {
    request: &'a Parts,
    failure: &'a AuthFailure,
    cookies: &'a LoginCookies,
}

impl<'a> AuthError<'a> {
    pub(crate) fn new(request: &'a Parts, failure: &'a AuthFailure, cookies: &'a LoginCookies) -> Self {
        Self {
            request,
            failure,
            cookies,
        }
    }

    pub fn request(&self) -> &'a Parts {
        self.request
    }

    pub fn failure(&self) -> &'a AuthFailure {
        self.failure
    }

    /// Expire both login cookies on `response`.
    pub fn logout(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        append_set_cookies(response.headers_mut(), &self.cookies.expire());
        response
    }
}

/// Produces the response for a rejected request.
pub trait AuthErrorHandler: Send + Sync {
    fn handle(&self, error: AuthError<'_>) -> Response;
}

impl<F> AuthErrorHandler for F
where
    F: Fn(AuthError<'_>) -> Response + Send + Sync,
{
    fn handle(&self, error: AuthError<'_>) -> Response {
        self(error)
    }
}

/// Clears the login cookies and answers `401 Unauthorized`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthErrorHandler;

impl AuthErrorHandler for DefaultAuthErrorHandler {
    fn handle(&self, error: AuthError<'_>) -> Response {
        error.logout((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
