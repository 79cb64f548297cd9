use thiserror::Error;

/// Why a request could not be authenticated.
///
/// Every variant is surfaced to callers the same way (401). The variants exist so
/// logs can tell a misbehaving client apart from a provider outage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,

    #[error("invalid authorization format")]
    MalformedHeader,

    #[error("invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    /// Stable, client-safe message. Provider detail stays in logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "Authorization header missing",
            AuthError::MalformedHeader => "Invalid authorization format",
            AuthError::InvalidToken(_) => "Invalid or expired token",
            AuthError::ProviderUnavailable(_) => "Token verification failed",
        }
    }
}
