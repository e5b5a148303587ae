//! Session cookie helpers.
//!
//! The session token travels in an HttpOnly cookie for browsers; API clients
//! may send the same token as `Authorization: Bearer`.

use axum::http::{
    header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::SessionConfig;

/// Builds and reads the session cookie.
#[derive(Debug, Clone)]
pub struct CookieHelper {
    name: String,
    secure: bool,
}

impl CookieHelper {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.name
    }

    /// Set-Cookie value carrying a session token.
    pub fn build_session_cookie(&self, token: &str, max_age_secs: i64) -> String {
        self.with_attributes(format!(
            "{}={}; Path=/; Max-Age={}",
            self.name, token, max_age_secs
        ))
    }

    /// Set-Cookie value that removes the session cookie.
    pub fn build_clear_cookie(&self) -> String {
        self.with_attributes(format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name
        ))
    }

    pub fn add_session_cookie(&self, headers: &mut HeaderMap, token: &str, max_age_secs: i64) {
        if let Ok(value) = HeaderValue::from_str(&self.build_session_cookie(token, max_age_secs)) {
            headers.append(SET_COOKIE, value);
        }
    }

    pub fn add_clear_cookie(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.build_clear_cookie()) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Extract a cookie value from request headers by name.
    pub fn extract_cookie<'a>(&self, headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .map(|s| s.trim())
            .find_map(|cookie| {
                let (cookie_name, cookie_value) = cookie.split_once('=')?;
                (cookie_name == name).then_some(cookie_value)
            })
    }

    /// Session token from the cookie, or from a Bearer header.
    pub fn extract_session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.extract_cookie(headers, &self.name)
            .filter(|token| !token.is_empty())
            .or_else(|| {
                headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
            })
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
