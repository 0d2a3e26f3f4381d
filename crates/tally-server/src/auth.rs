use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use tally_core::config::AuthMode;

use crate::error::AppError;

/// Gate for the read API.
///
/// With [`AuthMode::Token`] the request must carry `Authorization: Bearer
/// <token>` (scheme matched case-insensitively); anything else is rejected. With [`AuthMode::None`] the read API
/// is open.
pub fn authorize_read(headers: &HeaderMap, mode: &AuthMode) -> Result<(), AppError> {
    let AuthMode::Token(expected) = mode else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .ok_or(AppError::Unauthorized)?;

    // Compare fixed-length digests rather than the raw strings.
    if hash_token(presented) == hash_token(expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Hash a bearer token with SHA-256.
fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
