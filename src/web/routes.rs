//! Web API router construction and shared response utilities.

use axum::{
    Router,
    http::HeaderValue,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
};
use std::time::Duration;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::middleware::security_headers::security_headers;
use crate::web::{status, stories};

/// Cache-Control presets for public endpoints.
pub mod cache {
    /// The story ranking; short enough to track the server-side TTL.
    pub const STORIES: &str = "public, max-age=30, stale-while-revalidate=60";
    /// Operational endpoints -- never cache.
    pub const NO_STORE: &str = "private, no-store, must-revalidate";
}

/// Wraps a JSON response with a `Cache-Control` header.
pub fn with_cache_control<T: serde::Serialize>(value: T, header: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(header),
    );
    response
}

/// Creates the web server router
pub fn create_router(app_state: AppState, request_timeout: Duration) -> Router {
    let mut ops_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/latency", get(status::latency));
    if app_state.admin_ops {
        ops_router = ops_router.route("/cache", delete(status::invalidate_cache));
    }
    let ops_router = ops_router
        .layer(axum::middleware::map_response(
            |mut resp: Response| async move {
                resp.headers_mut().insert(
                    axum::http::header::CACHE_CONTROL,
                    HeaderValue::from_static(cache::NO_STORE),
                );
                resp
            },
        ))
        .with_state(app_state.clone());

    let api_router = Router::new()
        .route("/beststories", get(stories::best_stories))
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .nest("/api", ops_router)
        .layer((
            // Outermost: per-request ID span + severity-proportional response logging.
            RequestIdLayer,
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(tower_http::CompressionLevel::Fastest),
            TimeoutLayer::new(request_timeout),
            axum::middleware::map_response(security_headers),
        ))
}
