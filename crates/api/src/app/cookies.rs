//! `Set-Cookie` values for the session and the PKCE verifier.

use axum::http::{HeaderMap, HeaderValue, header};

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const OAUTH_VERIFIER: &str = "oauth_verifier";

pub const REFRESH_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
pub const VERIFIER_MAX_AGE_SECS: u64 = 10 * 60;

/// `name=value; Max-Age=..; Path=/; HttpOnly; SameSite=Lax[; Secure]`.
///
/// Returns `None` if the value cannot be carried in a header.
pub fn set_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Expire a cookie immediately.
pub fn clear_cookie(name: &str, secure: bool) -> Option<HeaderValue> {
    set_cookie(name, "", 0, secure)
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}
