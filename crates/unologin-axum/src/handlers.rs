use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header::LOCATION};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::append_set_cookies;
use crate::state::Unologin;

/// Query string of the provider's login callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginQuery {
    pub token: Option<String>,
}

/// Login callback: trade the one-time token for the login cookies.
///
/// Always ends the request with a `302` to the unologin front end, carrying
/// `success=true`, or `success=false&msg=<reason>` with no cookies set.
pub async fn login_event_handler(
    State(uno): State<Unologin>,
    query: Result<Query<LoginQuery>, QueryRejection>,
) -> Response {
    let frontend_url = &uno.config().realm.frontend_url;

    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            warn!(error = %e, "malformed login callback query");
            return login_redirect(frontend_url, Some("invalid token"));
        }
    };

    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        warn!("login callback without token");
        return login_redirect(frontend_url, Some("missing token"));
    };

    let login = match uno.verifier().verify(&token).await {
        Ok(login) => login,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "login token rejected");
            return login_redirect(frontend_url, Some(&e.public_message()));
        }
    };

    let cookies = match uno.cookies().set_login(&token, login.expires_at) {
        Ok(cookies) => cookies,
        Err(e) => {
            warn!(error = %e, "login token cannot be stored in a cookie");
            return login_redirect(frontend_url, Some("invalid token"));
        }
    };

    info!(asu_id = %login.payload.asu_id, "user logged in");
    let mut response = login_redirect(frontend_url, None);
    append_set_cookies(response.headers_mut(), &cookies);
    response
}

/// Terminal logout route: expires both login cookies and answers `200`.
pub async fn logout_handler(State(uno): State<Unologin>) -> Response {
    let mut response = StatusCode::OK.into_response();
    append_set_cookies(response.headers_mut(), &uno.cookies().expire());
    response
}

fn login_redirect(frontend_url: &str, failure: Option<&str>) -> Response {
    let separator = if frontend_url.contains('?') { '&' } else { '?' };
    let url = match failure {
        None => format!("{frontend_url}{separator}success=true"),
        Some(msg) => format!(
            "{frontend_url}{separator}success=false&msg={}",
            urlencoding::encode(msg)
        ),
    };

    match HeaderValue::from_str(&url) {
        Ok(location) => (
            StatusCode::FOUND,
            [(LOCATION, location)],
            format!("Found. Redirecting to {url}"),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "frontend_url is not a valid Location header");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    #[test]
    fn success_redirect() {
        let response = login_redirect("https://login.unolog.in", None);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "https://login.unolog.in?success=true");
    }

    #[test]
    fn failure_redirect_encodes_message() {
        let response = login_redirect("https://login.unolog.in/done?app=1", Some("invalid token"));
        assert_eq!(
            location(&response),
            "https://login.unolog.in/done?app=1&success=false&msg=invalid%20token"
        );
    }
}
