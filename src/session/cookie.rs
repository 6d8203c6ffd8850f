use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

use crate::shared::AppError;

pub const SESSION_COOKIE: &str = "token";

/// Returns the value of the named cookie from the request's `Cookie` headers
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// Builds the `Set-Cookie` value carrying a session token until it expires
pub fn session_cookie(token: &str, expires_at: DateTime<Utc>) -> Result<HeaderValue, AppError> {
    let cookie = format!(
        "{}={}; Expires={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        token,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );

    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::ReadFailure(format!("unable to build session cookie: {}", e)))
}
