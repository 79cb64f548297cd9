use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::{Value, json};

use echoes_auth::Identity;

use crate::app::dto;
use crate::app::errors::GatewayError;
use crate::app::services::Services;

pub async fn create_response(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<dto::CreateResponseRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let response = services
        .gateway
        .create_response(&identity, dto::body(payload)?)
        .await?;
    Ok(Json(json!({
        "message": "Response created successfully",
        "response": response,
    })))
}

pub async fn list_responses(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    q: Result<Query<dto::ResponsesQuery>, QueryRejection>,
) -> Result<Json<Value>, GatewayError> {
    let responses = services.gateway.list_responses(&identity, dto::query(q)?).await?;
    Ok(Json(json!({ "responses": dto::rows_to_json(responses) })))
}
