//! Best-stories handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;
use crate::stories::StoryResponse;
use crate::web::error::{ApiError, ApiErrorCode};
use crate::web::routes::{cache, with_cache_control};

fn default_count() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct BestStoriesParams {
    #[serde(default = "default_count")]
    pub n: i64,
}

/// `GET /api/beststories?n=10`
pub(super) async fn best_stories(
    State(state): State<AppState>,
    params: Result<Query<BestStoriesParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::new(
            ApiErrorCode::InvalidCount,
            format!("The value of 'n' should be an integer: {}", rejection.body_text()),
        )
    })?;
    if params.n <= 0 {
        return Err(ApiError::new(
            ApiErrorCode::InvalidCount,
            "The value of 'n' should be greater than 0.",
        ));
    }
    let n = usize::try_from(params.n).unwrap_or(usize::MAX);

    // Cancelled when this handler's future is dropped (client gone, timeout).
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let stories = state.stories.get_all(&cancel).await?;
    let body: Vec<StoryResponse> = stories.iter().take(n).map(StoryResponse::from).collect();

    Ok(with_cache_control(body, cache::STORIES))
}
