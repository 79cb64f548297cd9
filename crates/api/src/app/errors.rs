use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use echoes_auth::{AuthError, OwnershipError};
use echoes_core::DomainError;
use echoes_provider::ProviderError;

/// Everything a handler can fail with, mapped onto one HTTP status each.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("provider failure during {op}: {source}")]
    Provider {
        op: &'static str,
        #[source]
        source: ProviderError,
    },
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Ownership(_) => StatusCode::FORBIDDEN,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for GatewayError {
    fn from(value: DomainError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match &self {
            GatewayError::Auth(e) => {
                tracing::debug!(error = %e, "request not authenticated");
                json_error(status, "unauthorized", e.public_message())
            }
            GatewayError::Ownership(OwnershipError::OwnerMismatch { claimed }) => {
                tracing::warn!(claimed = %claimed, "owner mismatch");
                json_error(status, "forbidden", "Forbidden: User ID mismatch")
            }
            GatewayError::Validation(msg) => json_error(status, "validation_error", msg.clone()),
            GatewayError::Conflict(msg) => json_error(status, "conflict", msg.clone()),
            GatewayError::NotFound(msg) => json_error(status, "not_found", msg.clone()),
            GatewayError::Provider { op, source } => {
                tracing::error!(op = *op, error = %source, "provider call failed");
                json_error(status, "provider_error", format!("An internal error occurred during {op}"))
            }
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
