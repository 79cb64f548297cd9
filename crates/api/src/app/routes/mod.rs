use axum::{
    Router,
    routing::{get, post},
};

pub mod calls;
pub mod echoes;
pub mod oauth;
pub mod profiles;
pub mod responses;
pub mod search;
pub mod system;

/// Routes that run without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api", get(system::root))
        .route("/api/", get(system::root))
        .route("/api/profiles", get(profiles::list_profiles))
        .route("/api/auth/google/login", get(oauth::google_login))
        .route("/api/auth/google/signup", get(oauth::google_signup))
        .route("/api/auth/google/callback", get(oauth::google_callback))
        .route("/api/auth/logout", post(oauth::logout))
}

/// Routes that require an authenticated identity.
pub fn protected_router() -> Router {
    Router::new()
        .route("/api/whoami", get(system::whoami))
        .route("/api/profiles", post(profiles::create_profile))
        .route(
            "/api/profiles/:user_id",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route("/api/calls", post(calls::create_call).get(calls::list_calls))
        .route("/api/calls/:id", get(calls::get_call))
        .route("/api/calls/:id/amplify", post(calls::amplify))
        .route("/api/calls/:id/bookmark", post(calls::bookmark))
        .route("/api/calls/:id/interactions", get(calls::interactions))
        .route(
            "/api/responses",
            post(responses::create_response).get(responses::list_responses),
        )
        .route("/api/echoes", post(echoes::create_echo).get(echoes::list_echoes))
        .route("/api/search", get(search::search))
}
