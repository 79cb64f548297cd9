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

pub async fn create_echo(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<dto::CreateEchoRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let echo = services
        .gateway
        .create_echo(&identity, dto::body(payload)?)
        .await?;
    Ok(Json(json!({
        "message": "Echo created successfully",
        "echo": echo,
    })))
}

pub async fn list_echoes(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    q: Result<Query<dto::EchoesQuery>, QueryRejection>,
) -> Result<Json<Value>, GatewayError> {
    let echoes = services.gateway.list_echoes(&identity, dto::query(q)?).await?;
    Ok(Json(json!({ "echoes": dto::rows_to_json(echoes) })))
}
