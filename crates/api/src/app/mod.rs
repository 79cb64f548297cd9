//! HTTP application wiring (Axum router + provider services).
//!
//! - `services.rs`: provider wiring and the gateway operations
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: request/response DTOs and JSON helpers
//! - `errors.rs`: error taxonomy and its HTTP mapping
//! - `cookies.rs`: session and PKCE cookies

use std::sync::Arc;

use axum::{Extension, Router, http::HeaderValue, http::Method, http::header};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod cookies;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::Services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Services) -> Router {
    let auth_state = middleware::AuthState {
        verifier: services.verifier.clone(),
    };
    let cors = cors_layer(&services.web.cors_origins);
    let services = Arc::new(services);

    // Protected routes: the identity is resolved before any handler runs.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(Extension(services)),
        )
}

/// Credentialed CORS for the configured frontend origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
