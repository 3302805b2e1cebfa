//! Device API Routes

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::{parse_bool, DeviceSetParams, OkResponse};
use crate::state::AppState;
use crate::state_store::DeviceEntry;

/// GET /device/set
pub async fn set_from_query(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<OkResponse>> {
    let params = DeviceSetParams::from_query(&query)?;
    apply(&state, params).await
}

/// POST /device/set with a JSON body
pub async fn set_from_body(State(state): State<AppState>, body: Bytes) -> Result<Json<OkResponse>> {
    let json: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::BadRequest(format!("invalid JSON body: {}", e)))?;
    let params = DeviceSetParams::from_json(&json)?;
    apply(&state, params).await
}

async fn apply(state: &AppState, params: DeviceSetParams) -> Result<Json<OkResponse>> {
    let entry = DeviceEntry::new(
        params.show_name,
        params.using,
        params.app_name,
        state.config.not_using.as_deref(),
    );
    state.store.set_device(&params.id, entry).await;
    Ok(Json(OkResponse::ok()))
}

/// GET /device/remove?id=<id>
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<OkResponse>> {
    let id = query
        .get("id")
        .ok_or_else(|| Error::BadRequest("missing param 'id'".to_string()))?;
    state.store.remove_device(id).await?;
    Ok(Json(OkResponse::ok()))
}

/// GET /device/clear
pub async fn clear(State(state): State<AppState>) -> Json<OkResponse> {
    state.store.clear_devices().await;
    Json(OkResponse::ok())
}

/// GET /device/private_mode?private=<bool>
pub async fn private_mode(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<OkResponse>> {
    let private = query
        .get("private")
        .and_then(|v| parse_bool(v))
        .ok_or_else(|| {
            Error::InvalidRequest("\"private\" arg only supports boolean type".to_string())
        })?;

    state.store.set_private_mode(private).await;
    Ok(Json(OkResponse::ok()))
}
