use thiserror::Error;

use echoes_auth::ResolveError;
use echoes_core::Table;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A unique constraint on `table` rejected the write.
    #[error("unique constraint violated on {table}: {detail}")]
    UniqueViolation { table: Table, detail: String },

    /// The provider understood the request and refused it (4xx).
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// Transport failure, timeout or 5xx.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a shape we do not understand.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<ProviderError> for ResolveError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Rejected(msg) | ProviderError::Decode(msg) => ResolveError::Rejected(msg),
            ProviderError::UniqueViolation { detail, .. } => ResolveError::Rejected(detail),
            ProviderError::Unavailable(msg) => ResolveError::Unavailable(msg),
        }
    }
}
