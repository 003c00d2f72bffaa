//! Pipeline stages, attached with `axum::middleware::from_fn_with_state`.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};
use unologin_auth::{login_token, parse_cookie_header};

use crate::append_set_cookies;
use crate::context::AuthContext;
use crate::dispatch::AuthFailure;
use crate::state::Unologin;

/// Global stage: turn a login cookie into an [`AuthContext`].
///
/// - no cookie, or a blank one: continue without context
/// - a cookie that verifies: insert the context and continue
/// - a cookie that does not: stop and hand over to the error handler
pub async fn parse_login(State(uno): State<Unologin>, mut req: Request, next: Next) -> Response {
    let Some(token) = login_cookie(req.headers()) else {
        return next.run(req).await;
    };

    match uno.verifier().verify(&token).await {
        Ok(login) => {
            debug!(asu_id = %login.payload.asu_id, "login cookie accepted");
            req.extensions_mut().insert(AuthContext {
                user: login.payload,
            });
            next.run(req).await
        }
        Err(e) => {
            warn!(kind = e.kind(), path = %req.uri().path(), "login cookie rejected");
            let (parts, _body) = req.into_parts();
            uno.reject(&parts, &AuthFailure::InvalidCookie(e))
        }
    }
}

/// Route stage: only let requests through that [`parse_login`] authenticated.
///
/// Does no verification of its own, so it must sit inside `parse_login`.
pub async fn require_login(State(uno): State<Unologin>, req: Request, next: Next) -> Response {
    if req.extensions().get::<AuthContext>().is_some() {
        return next.run(req).await;
    }

    debug!(path = %req.uri().path(), "login required");
    let (parts, _body) = req.into_parts();
    uno.reject(&parts, &AuthFailure::NotLoggedIn)
}

/// Mid-pipeline logout: run the rest of the pipeline, then expire both
/// login cookies on whatever response comes back.
pub async fn logout(State(uno): State<Unologin>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    append_set_cookies(response.headers_mut(), &uno.cookies().expire());
    response
}

fn login_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    login_token(&parse_cookie_header(&header)).map(ToString::to_string)
}
