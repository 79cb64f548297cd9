use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use echoes_core::UserId;

/// Tokens issued to signed-in users carry this audience and role.
pub const AUTHENTICATED: &str = "authenticated";

/// Tolerated clock skew between the provider and this process for `iat`.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 30;

/// Claims the identity provider puts in its access tokens.
///
/// Only the claims the gateway reads are modelled; anything else in the token is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderClaims {
    /// Subject: the identity the token was issued to.
    pub sub: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token role '{0}' is not allowed")]
    WrongRole(String),
}

/// Deterministically validate decoded claims.
///
/// Signature and audience checks happen while decoding; this covers the time
/// window and the role so it can be tested with a fixed `now`.
pub fn validate_claims(claims: &ProviderClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();

    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + ISSUED_AT_LEEWAY_SECS < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    match claims.role.as_deref() {
        None | Some(AUTHENTICATED) => Ok(()),
        Some(other) => Err(TokenValidationError::WrongRole(other.to_string())),
    }
}
