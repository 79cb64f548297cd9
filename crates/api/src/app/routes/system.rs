use axum::{Extension, Json, http::StatusCode};
use serde_json::{Value, json};

use echoes_auth::Identity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the backend!" }))
}

pub async fn whoami(Extension(identity): Extension<Identity>) -> Json<Value> {
    Json(json!({ "user_id": identity.user_id().to_string() }))
}
