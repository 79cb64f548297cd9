use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use echoes_auth::{AuthError, TokenVerifier};

use crate::app::errors::GatewayError;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: TokenVerifier,
}

/// Resolve the bearer token and attach the caller's [`echoes_auth::Identity`].
///
/// Fails closed: the handler never runs without an identity.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = match authorization(req.headers()) {
        Ok(h) => h,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    let identity = match state.verifier.verify(header.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// The raw `Authorization` value; non-visible-ASCII bytes make it malformed.
fn authorization(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    match headers.get(header::AUTHORIZATION) {
        None => Ok(None),
        Some(v) => v
            .to_str()
            .map(|s| Some(s.to_string()))
            .map_err(|_| AuthError::MalformedHeader),
    }
}
