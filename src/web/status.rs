//! Health, status and latency handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, trace};

use crate::state::AppState;
use crate::stories::LatencyReport;
use crate::web::error::{ApiError, ApiErrorCode};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    populated: bool,
    age_secs: Option<u64>,
    ttl_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    version: &'static str,
    commit: &'static str,
    uptime_secs: u64,
    cache: CacheStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatencyParams {
    #[serde(default)]
    pub reset: bool,
}

/// Health check endpoint
pub(super) async fn health() -> Json<Value> {
    trace!("health check requested");
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Build and cache state
pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let cache = state.stories.cache();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_SHORT"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cache: CacheStatus {
            populated: cache.is_populated(),
            age_secs: cache.entry_age().map(|age| age.as_secs()),
            ttl_secs: cache.ttl().as_secs(),
        },
    })
}

/// `GET /api/latency?reset=true`
pub(super) async fn latency(
    State(state): State<AppState>,
    Query(params): Query<LatencyParams>,
) -> Result<Json<LatencyReport>, ApiError> {
    let recorder = state.stories.latency();
    if !params.reset {
        return Ok(Json(recorder.summarize()));
    }
    if !state.admin_ops {
        return Err(ApiError::new(
            ApiErrorCode::Forbidden,
            "Resetting latency statistics is disabled",
        ));
    }
    Ok(Json(recorder.take_report()))
}

/// `DELETE /api/cache`
pub(super) async fn invalidate_cache(State(state): State<AppState>) -> StatusCode {
    state.stories.invalidate();
    info!("best stories cache invalidated on request");
    StatusCode::NO_CONTENT
}
