use axum::http::{HeaderMap, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};

pub fn get_header(headers: &HeaderMap, key: impl header::AsHeaderName) -> Option<&str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}

/// Token following a `Bearer ` prefix in the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    get_header(headers, header::AUTHORIZATION)?
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn random_urlsafe_string(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
