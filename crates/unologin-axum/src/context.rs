use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum::response::Response;
use serde::Serialize;
use unologin_api::LoginPayload;

use crate::dispatch::AuthFailure;
use crate::state::Unologin;

/// Identity of the current request, present once [`crate::parse_login`]
/// accepted its login cookie.
///
/// Usable as an extractor: `AuthContext` rejects through the configured
/// [`crate::AuthErrorHandler`] when absent, `Option<AuthContext>` never
/// rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user: LoginPayload,
}

impl<S> FromRequestParts<S> for AuthContext
where
    Unologin: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }
        let uno = Unologin::from_ref(state);
        Err(uno.reject(parts, &AuthFailure::NotLoggedIn))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthContext>().cloned())
    }
}
