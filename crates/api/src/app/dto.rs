//! Request DTOs and JSON mapping helpers.
//!
//! Every field is optional at the wire level; presence and shape are checked by the
//! gateway so a missing field is a 400 with the field name, never a serde error.

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use echoes_core::Row;

use crate::app::errors::GatewayError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateProfileRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCallRequest {
    pub user_id: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateResponseRequest {
    pub call_id: Option<String>,
    pub user_id: Option<String>,
    pub response_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateEchoRequest {
    pub call_id: Option<String>,
    pub response_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsesQuery {
    pub call_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EchoesQuery {
    pub call_id: Option<String>,
    pub response_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interactions {
    pub call_id: String,
    pub amplifies_count: usize,
    pub bookmarks_count: usize,
    pub echoes_count: usize,
    pub responses_count: usize,
    pub is_amplified: bool,
    pub is_bookmarked: bool,
    pub is_echoed: bool,
    pub responses: Vec<Row>,
    pub echoes: Vec<Row>,
    pub amplifies: Vec<Row>,
    pub bookmarks: Vec<Row>,
}

// -------------------------
// Helpers
// -------------------------

/// Unwrap a JSON body, turning axum's rejection (bad content type, bad JSON) into a 400.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| GatewayError::validation(format!("Invalid request body: {}", e.body_text())))
}

/// Unwrap a query string, turning axum's rejection (duplicate or malformed keys) into a 400.
pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, GatewayError> {
    params
        .map(|Query(v)| v)
        .map_err(|e| GatewayError::validation(format!("Invalid query string: {}", e.body_text())))
}

pub fn rows_to_json(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// True if any row's `user_id` is `user_id`.
pub fn contains_user(rows: &[Row], user_id: &str) -> bool {
    rows.iter()
        .any(|r| r.get("user_id").and_then(Value::as_str) == Some(user_id))
}
