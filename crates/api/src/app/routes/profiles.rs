use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
};
use serde_json::{Value, json};

use echoes_auth::Identity;

use crate::app::dto;
use crate::app::errors::GatewayError;
use crate::app::services::Services;

/// Public: every profile.
pub async fn list_profiles(Extension(services): Extension<Arc<Services>>) -> Result<Json<Value>, GatewayError> {
    let profiles = services.gateway.list_profiles().await?;
    Ok(Json(json!({ "profiles": dto::rows_to_json(profiles) })))
}

pub async fn get_profile(
    Extension(services): Extension<Arc<Services>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let profile = services.gateway.get_profile(&user_id).await?;
    Ok(Json(json!({ "profile": profile })))
}

pub async fn create_profile(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<dto::CreateProfileRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let profile = services
        .gateway
        .create_profile(&identity, dto::body(payload)?)
        .await?;
    tracing::info!(user_id = %identity.user_id(), "profile created");
    Ok(Json(json!({
        "message": "Profile created successfully",
        "profile": profile,
    })))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<Services>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
    payload: Result<Json<dto::UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let profile = services
        .gateway
        .update_profile(&identity, &user_id, dto::body(payload)?)
        .await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}
