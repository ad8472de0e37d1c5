//! Access token claim introspection.
//!
//! Microsoft identity platform tokens for Graph cannot be signature-verified
//! by a client (Graph tokens carry a `nonce` header), so this module only
//! reads the claims the client needs: which permission scopes were granted
//! and when the token expires. Expiry is still enforced.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for access token inspection.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Claims of a Microsoft identity platform access token that matter to a Graph client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Tenant the token was issued for
    #[serde(default)]
    pub tid: Option<String>,
    /// Delegated permissions, space separated
    #[serde(default)]
    pub scp: Option<String>,
    /// Application permissions
    #[serde(default)]
    pub roles: Vec<String>,
    /// Signed-in user, absent for app-only tokens
    #[serde(default)]
    pub upn: Option<String>,
    /// Display name of the client application
    #[serde(default)]
    pub app_displayname: Option<String>,
}

impl AccessTokenClaims {
    /// Every permission granted by the token, delegated and application alike.
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = self
            .scp
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        scopes.extend(self.roles.iter().cloned());
        scopes
    }

    /// Expiry as a timestamp, `None` if the claim is out of range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Whether the token was issued to an application rather than a user.
    pub fn is_app_only(&self) -> bool {
        self.scp.is_none() && self.upn.is_none()
    }
}

/// Decodes the claims of an access token without verifying its signature.
///
/// `leeway_secs` is the clock skew tolerated when checking `exp`.
pub fn decode_access_token(token: &str, leeway_secs: u64) -> Result<AccessTokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.leeway = leeway_secs;

    let token_data = decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => TokenError::InvalidToken,
            _ => TokenError::DecodingError(e.to_string()),
        })?;

    Ok(token_data.claims)
}
