use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Why a token's expiry could not be read.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token does not have three dot-separated segments")]
    Structure,
    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token payload has no numeric exp claim")]
    MissingExpiry,
}

/// Reads the `exp` claim (seconds since the epoch) from the payload segment
/// of a `header.payload.signature` token. The signature is not verified.
pub fn token_expiry(token: &str) -> Result<i64, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenError::Structure);
    };
    if payload.is_empty() {
        return Err(TokenError::Structure);
    }

    // Accept both the URL-safe and the standard alphabet, padded or not.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let decoded = URL_SAFE_NO_PAD.decode(normalized)?;
    let claims: Value = serde_json::from_slice(&decoded)?;

    claims
        .get("exp")
        .and_then(Value::as_f64)
        .filter(|exp| exp.is_finite())
        .map(|exp| exp.floor() as i64)
        .ok_or(TokenError::MissingExpiry)
}

/// True when the token expired at or before `now`, or cannot be decoded.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        Ok(exp) => exp <= now,
        Err(e) => {
            warn!(
                event_name = "session.token.decode_failed",
                event_domain = "session",
                "Treating unreadable token as expired: {}",
                e
            );
            true
        }
    }
}

/// `is_token_expired_at` against the current wall clock.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp())
}
