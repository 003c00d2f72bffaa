//! unologin-axum
//!
//! Login middleware for axum apps authenticating through unologin.
//!
//! Three stages cooperate per request:
//!
//! - [`login_event_handler`] on the provider callback route exchanges the
//!   one-time `?token=` for the login cookies and redirects back to the
//!   unologin front end
//! - [`parse_login`] runs on every route; a valid cookie becomes an
//!   [`AuthContext`] in the request extensions, an invalid one is rejected
//! - [`require_login`] guards protected routes and rejects requests without
//!   an [`AuthContext`]
//!
//! Rejections go through the configured [`AuthErrorHandler`]; the default
//! clears the login cookies and answers `401`.
//!
//! ```no_run
//! use axum::{Router, middleware, routing::{get, post}};
//! use unologin_axum::{AuthContext, Unologin, logout_handler, parse_login, require_login};
//! use unologin_core::{Realm, UnologinConfig};
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let uno = Unologin::from_config(
//!     UnologinConfig::new("my-api-key", Realm::default()).with_cookies_domain(".example.com"),
//! )?;
//!
//! let protected = Router::new()
//!     .route("/me", get(|ctx: AuthContext| async move { ctx.user.asu_id }))
//!     .route_layer(middleware::from_fn_with_state(uno.clone(), require_login));
//!
//! let app: Router = Router::new()
//!     .merge(protected)
//!     .route("/logout", post(logout_handler))
//!     .layer(middleware::from_fn_with_state(uno.clone(), parse_login))
//!     .merge(uno.login_routes())
//!     .with_state(uno);
//! # let _ = app;
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]

mod context;
mod dispatch;
mod handlers;
mod middleware;
mod state;

pub use context::AuthContext;
pub use dispatch::{AuthError, AuthErrorHandler, AuthFailure, DefaultAuthErrorHandler};
pub use handlers::{LoginQuery, login_event_handler, logout_handler};
pub use middleware::{logout, parse_login, require_login};
pub use state::Unologin;

use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use tracing::warn;

fn append_set_cookies(headers: &mut HeaderMap, cookies: &[String]) {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "dropping unrepresentable Set-Cookie header"),
        }
    }
}
