//! Login cookie codec.
//!
//! Two cookies make up a session: the login token (HttpOnly) and a login
//! state marker that client script may read. They are always written and
//! cleared together.

use crate::{Error, Result};
use httpdate::fmt_http_date;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use unologin_core::{CookieSettings, SameSite};

/// Carries the login token verbatim.
pub const LOGIN_TOKEN_COOKIE: &str = "_uno_appLoginToken";

/// Carries [`LOGIN_STATE_SUCCESS`] while a session exists.
pub const LOGIN_STATE_COOKIE: &str = "_uno_loginState";

/// Value of the login state cookie after a successful login.
pub const LOGIN_STATE_SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy)]
enum Lifetime {
    Session,
    Until(SystemTime),
    Expired,
}

/// Builds `Set-Cookie` values for the login cookie pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCookies {
    domain: Option<String>,
    path: String,
    secure: bool,
    same_site: SameSite,
}

impl LoginCookies {
    pub fn new(domain: Option<String>, settings: &CookieSettings) -> Self {
        Self {
            domain,
            path: settings.path.clone(),
            secure: settings.secure,
            same_site: settings.same_site,
        }
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// `Set-Cookie` values for a fresh session: token cookie first, state
    /// cookie second. When `expires_at` is known both cookies expire with the
    /// token.
    ///
    /// # Errors
    ///
    /// Fails if `token` contains characters a cookie value cannot hold.
    pub fn set_login(&self, token: &str, expires_at: Option<SystemTime>) -> Result<[String; 2]> {
        if token.is_empty() || !token.bytes().all(is_cookie_octet) {
            return Err(Error::CookieValue(LOGIN_TOKEN_COOKIE));
        }

        let lifetime = expires_at.map_or(Lifetime::Session, Lifetime::Until);
        Ok([
            self.build(LOGIN_TOKEN_COOKIE, token, true, lifetime),
            self.build(LOGIN_STATE_COOKIE, LOGIN_STATE_SUCCESS, false, lifetime),
        ])
    }

    /// `Set-Cookie` values that make the browser drop both cookies.
    pub fn expire(&self) -> [String; 2] {
        [
            self.build(LOGIN_TOKEN_COOKIE, "", true, Lifetime::Expired),
            self.build(LOGIN_STATE_COOKIE, "", false, Lifetime::Expired),
        ]
    }

    fn build(&self, name: &str, value: &str, http_only: bool, lifetime: Lifetime) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.push(format!("{name}={value}"));
        parts.push(format!("Path={}", self.path));

        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }

        if self.secure {
            parts.push("Secure".to_string());
        }
        if http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push(format!("SameSite={}", same_site_str(self.same_site)));

        match lifetime {
            Lifetime::Session => {}
            Lifetime::Until(at) => {
                let max_age = at
                    .duration_since(SystemTime::now())
                    .map_or(0, |d| d.as_secs());
                parts.push(format!("Max-Age={max_age}"));
                // Expires for older clients.
                parts.push(format!("Expires={}", fmt_http_date(at)));
            }
            Lifetime::Expired => {
                parts.push("Max-Age=0".to_string());
                parts.push(format!("Expires={}", fmt_http_date(UNIX_EPOCH)));
            }
        }

        parts.join("; ")
    }
}

fn same_site_str(same_site: SameSite) -> &'static str {
    match same_site {
        SameSite::Strict => "Strict",
        SameSite::Lax => "Lax",
        SameSite::None => "None",
    }
}

// RFC 6265 cookie-octet.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// Parse a `Cookie` request header into name/value pairs.
///
/// The first occurrence of a name wins. Quoted values are unquoted and
/// percent-encoded values decoded; fragments without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || cookies.contains_key(name) {
            continue;
        }

        let mut value = value.trim();
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value = &value[1..value.len() - 1];
        }
        let value = urlencoding::decode(value)
            .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
        cookies.insert(name.to_string(), value);
    }
    cookies
}

/// The login token from parsed cookies. A blank token counts as absent.
pub fn login_token(cookies: &BTreeMap<String, String>) -> Option<&str> {
    cookies
        .get(LOGIN_TOKEN_COOKIE)
        .map(String::as_str)
        .filter(|token| !token.trim().is_empty())
}
