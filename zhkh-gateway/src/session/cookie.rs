/// Session cookie
///
/// ```text
/// zhkh_session=<token>; Path=/; HttpOnly; SameSite=Lax; Max-Age=<ttl>[; Secure]
/// ```

use axum::http::{header, HeaderMap};
use std::time::Duration;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "zhkh_session";

/// `Set-Cookie` value carrying a new session token
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    with_secure(
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            ttl.as_secs()
        ),
        secure,
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(secure: bool) -> String {
    with_secure(
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE),
        secure,
    )
}

fn with_secure(mut cookie: String, secure: bool) -> String {
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session token from the request `Cookie` headers, if any
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
