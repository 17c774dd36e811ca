//! Access token verification
//!
//! Tokens are minted by the account module and carried as a bearer
//! header or an `accessToken` cookie. They are HMAC-signed, so no
//! server-side session storage is needed.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Identity claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// ID of the authenticated user
    pub user_id: String,
    pub username: String,
    /// When the token was issued
    pub created_at: DateTime<Utc>,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    /// Claims for `user_id` valid for `max_age_secs` from now
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, max_age_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            username: username.into(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(max_age_secs),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

fn signer(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid token secret: {}", e)))
}

/// Create a signed access token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_access_token(claims: &AccessClaims, secret: &str) -> Result<String, AppError> {
    let payload = serde_json::to_string(claims).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    let mut mac = signer(secret)?;
    mac.update(payload_b64.as_bytes());
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode an access token
///
/// # Errors
/// `Unauthorized` if the token is malformed, badly signed or expired
pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessClaims, AppError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let mut mac = signer(secret)?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;
    let claims: AccessClaims =
        serde_json::from_slice(&payload).map_err(|_| AppError::Unauthorized)?;

    if claims.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}
