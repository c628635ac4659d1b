/// Bearer token claims decoding and expiry checks.
///
/// Claims are read without verifying the signature. The result only gates the
/// UI; the API re-validates the token on every authorized call.
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;

use crate::clock::Clock;
use crate::error::Result;
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch
    pub exp: f64,
    #[serde(default)]
    pub sub: Option<String>,
}

impl Claims {
    pub fn expires_at_ms(&self) -> f64 {
        self.exp * 1000.0
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token must have three segments, found {0}")]
    Segments(usize),
    #[error("claims segment is not base64url: {0}")]
    Encoding(String),
    #[error("claims segment is not valid JSON claims: {0}")]
    Claims(String),
}

/// Decode the middle segment of a JWT
pub fn decode_claims(token: &str) -> std::result::Result<Claims, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Segments(parts.len()));
    }

    let payload = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Claims(e.to_string()))
}

/// Malformed tokens count as expired.
pub fn is_expired(token: &str, now_ms: u64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.expires_at_ms() < now_ms as f64,
        Err(e) => {
            log::debug!("Treating malformed token as expired: {}", e);
            true
        }
    }
}

/// Expiry checks against a clock, plus reading the token out of a store
#[derive(Debug, Clone)]
pub struct TokenValidator<C> {
    clock: C,
}

impl<C: Clock> TokenValidator<C> {
    pub fn new(clock: C) -> Self {
        TokenValidator { clock }
    }

    pub fn is_expired(&self, token: &str) -> bool {
        is_expired(token, self.clock.now_ms())
    }

    /// The stored token if there is one and it has not expired.
    ///
    /// The store is always read before the expiry check.
    pub async fn live_token<S: SessionStore>(&self, store: &S) -> Result<Option<String>> {
        let token = store.get().await?;
        Ok(token.filter(|t| !self.is_expired(t)))
    }
}
