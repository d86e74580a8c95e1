use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

/// Claims we care about from the backend's JWTs. Only the payload segment is
/// decoded; the signature is never checked here. Any trust decision belongs
/// to the backend, which re-validates the token on every request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPayload {
    /// Expiry, seconds since epoch.
    pub exp: Option<i64>,
    pub sub: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is not three dot-separated segments")]
    Malformed,
    #[error("payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the payload (middle) segment of a JWT without verification.
pub fn decode_payload(token: &str) -> Result<TokenPayload, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }
    // Some issuers pad the segment; base64url in JWTs is unpadded.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: TokenPayload = serde_json::from_slice(&bytes)?;
    Ok(claims)
}

/// Expiry check against a wall-clock time in milliseconds. A token without
/// an `exp` claim never expires client-side.
pub fn is_expired(payload: &TokenPayload, now_ms: i64) -> bool {
    match payload.exp {
        Some(exp) => exp.saturating_mul(1000) <= now_ms,
        None => false,
    }
}
