//! Agent secret check

use axum::http::HeaderMap;

pub const SECRET_HEADER: &str = "x-agent-secret";

/// Compare two secrets without short-circuiting on the first differing byte
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Secret from the header, falling back to the body field
pub fn provided_secret<'a>(headers: &'a HeaderMap, body_secret: Option<&'a str>) -> Option<&'a str> {
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(body_secret)
}
