//! API Routes

use axum::{
    extract::{Query, State},
    http::{HeaderName, StatusCode},
    middleware,
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::convert::Infallible;

use super::device_routes;
use crate::auth::require_secret;
use crate::error::{Error, Result};
use crate::models::{OkResponse, SaveDataResult, SetStatusResult};
use crate::realtime_hub;
use crate::request_telemetry::record_request;
use crate::state::AppState;
use crate::status_catalog::StatusRecord;
use crate::status_query::{self, StatusSnapshot};
use crate::state_store::{MetricsReport, StoredData};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Create API router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/set", get(set_status))
        .route(
            "/device/set",
            get(device_routes::set_from_query).post(device_routes::set_from_body),
        )
        .route("/device/remove", get(device_routes::remove))
        .route("/device/clear", get(device_routes::clear))
        .route("/device/private_mode", get(device_routes::private_mode))
        .route("/save_data", get(save_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_secret));

    let mut button = Router::new().route("/button1", post(button1));
    if state.config.button_requires_secret {
        button = button.route_layer(middleware::from_fn_with_state(state.clone(), require_secret));
    }

    let mut public = Router::new()
        .route("/query", get(query))
        .route("/status_list", get(status_list))
        .route("/events", get(events))
        .route("/none", get(none));
    if state.config.metrics_enabled {
        public = public.route("/metrics", get(metrics));
    }

    public
        .merge(protected)
        .merge(button)
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

// ========================================
// Public
// ========================================

async fn query(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(status_query::build(&state.store, &state.status_catalog, &state.config).await)
}

async fn status_list(State(state): State<AppState>) -> Json<Vec<StatusRecord>> {
    Json(state.status_catalog.records().to_vec())
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.store.metrics_report().await)
}

/// Placeholder endpoint for clients probing reachability
async fn none() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// SSE status stream
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = realtime_hub::frames(state).map(|frame| Ok::<_, Infallible>(Event::from(frame)));
    ([(X_ACCEL_BUFFERING, "no")], Sse::new(stream))
}

/// DG-LAB button; always answers 200 with a text report
async fn button1(State(state): State<AppState>) -> String {
    state.dglab.trigger().await
}

// ========================================
// Protected
// ========================================

async fn set_status(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<OkResponse<SetStatusResult>>> {
    let status = params
        .get("status")
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| Error::BadRequest("argument 'status' must be int".to_string()))?;

    state.store.set_status(status).await;
    Ok(Json(OkResponse::with(SetStatusResult { set_to: status })))
}

async fn save_data(
    State(state): State<AppState>,
) -> Result<Json<OkResponse<SaveDataResult<StoredData>>>> {
    state.store.save().await?;
    let data = state.store.snapshot().await;
    Ok(Json(OkResponse::with(SaveDataResult { data })))
}
