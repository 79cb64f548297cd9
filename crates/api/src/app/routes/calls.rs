use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
};
use serde_json::{Value, json};

use echoes_auth::Identity;
use echoes_core::Table;

use crate::app::dto;
use crate::app::errors::GatewayError;
use crate::app::services::Services;

pub async fn create_call(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<dto::CreateCallRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let call = services
        .gateway
        .create_call(&identity, dto::body(payload)?)
        .await?;
    Ok(Json(json!({
        "message": "Call created successfully",
        "call": call,
    })))
}

/// The caller's own calls.
pub async fn list_calls(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, GatewayError> {
    let calls = services.gateway.list_calls(&identity).await?;
    Ok(Json(json!({ "calls": dto::rows_to_json(calls) })))
}

pub async fn get_call(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let call = services.gateway.get_call(&id).await?;
    Ok(Json(json!({ "call": call })))
}

pub async fn amplify(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let amplified = services.gateway.toggle(Table::Amplifies, &identity, &id).await?;
    let message = if amplified { "Call amplified" } else { "Amplify removed" };
    Ok(Json(json!({ "message": message, "amplified": amplified })))
}

pub async fn bookmark(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let bookmarked = services.gateway.toggle(Table::Bookmarks, &identity, &id).await?;
    let message = if bookmarked { "Call bookmarked" } else { "Bookmark removed" };
    Ok(Json(json!({ "message": message, "bookmarked": bookmarked })))
}

pub async fn interactions(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<dto::Interactions>, GatewayError> {
    Ok(Json(services.gateway.interactions(&identity, &id).await?))
}
