use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
};
use serde_json::{Value, json};

use crate::app::dto;
use crate::app::errors::GatewayError;
use crate::app::services::Services;

pub async fn search(
    Extension(services): Extension<Arc<Services>>,
    q: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> Result<Json<Value>, GatewayError> {
    let (query, calls, profiles) = services.gateway.search(dto::query(q)?.query).await?;
    Ok(Json(json!({
        "calls": dto::rows_to_json(calls),
        "profiles": dto::rows_to_json(profiles),
        "query": query,
    })))
}
