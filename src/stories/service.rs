//! The best-stories read path: cache, upstream ranking, fan-out, timing.

use crate::hn::{HnApiError, StorySource};
use crate::stories::cache::{CacheError, CacheOutcome, SingleFlightCache};
use crate::stories::detail::DetailFetcher;
use crate::stories::fanout::FanOut;
use crate::stories::latency::LatencyRecorder;
use crate::stories::models::Story;
use crate::utils::fmt_duration;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// The ranking itself could not be fetched or decoded.
    #[error("failed to fetch best story ids")]
    Upstream(#[from] HnApiError),
    #[error("request cancelled")]
    Cancelled,
    #[error("story refresh aborted unexpectedly")]
    RefreshAborted(#[source] tokio::task::JoinError),
}

impl From<CacheError<StoryError>> for StoryError {
    fn from(err: CacheError<StoryError>) -> Self {
        match err {
            CacheError::Cancelled => Self::Cancelled,
            CacheError::Aborted(e) => Self::RefreshAborted(e),
            CacheError::Load(e) => e,
        }
    }
}

/// Serves the full best-stories ranking, sorted by score, from a TTL cache
/// that is refreshed by at most one upstream fan-out at a time.
pub struct StoryService {
    source: Arc<dyn StorySource>,
    fan_out: FanOut,
    cache: SingleFlightCache<Vec<Story>>,
    latency: Arc<LatencyRecorder>,
    /// Cancels in-flight refreshes when the process shuts down.
    shutdown: CancellationToken,
}

impl StoryService {
    pub fn new(
        source: Arc<dyn StorySource>,
        max_concurrency: usize,
        cache_ttl: Duration,
        latency: Arc<LatencyRecorder>,
        shutdown: CancellationToken,
    ) -> Self {
        let fan_out = FanOut::new(DetailFetcher::new(source.clone()), max_concurrency);
        Self {
            source,
            fan_out,
            cache: SingleFlightCache::new(cache_ttl),
            latency,
            shutdown,
        }
    }

    /// All best stories, highest score first.
    ///
    /// `cancel` only abandons this caller's wait; a refresh it started keeps
    /// running for other callers.
    pub async fn get_all(&self, cancel: &CancellationToken) -> Result<Arc<Vec<Story>>, StoryError> {
        let start = Instant::now();

        let source = self.source.clone();
        let fan_out = self.fan_out.clone();
        let shutdown = self.shutdown.clone();
        let result = self
            .cache
            .get_or_refresh(cancel, move || async move {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Err(StoryError::Cancelled),
                    stories = refresh(source.as_ref(), &fan_out) => stories,
                }
            })
            .await;

        let elapsed = start.elapsed();
        match result {
            Ok((stories, outcome)) => {
                self.latency.record(outcome, elapsed);
                if outcome == CacheOutcome::Miss {
                    info!(
                        stories = stories.len(),
                        duration = fmt_duration(elapsed),
                        "best stories refreshed"
                    );
                }
                Ok(stories)
            }
            Err(e) => {
                let err = StoryError::from(e);
                match &err {
                    StoryError::Cancelled => {
                        debug!(duration = fmt_duration(elapsed), "best stories read cancelled")
                    }
                    _ => warn!(error = ?err, duration = fmt_duration(elapsed), "best stories read failed"),
                }
                Err(err)
            }
        }
    }

    /// Drop the cached ranking so the next read refreshes from upstream.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &SingleFlightCache<Vec<Story>> {
        &self.cache
    }

    pub fn latency(&self) -> &Arc<LatencyRecorder> {
        &self.latency
    }
}

/// Fetch the ranking and every story's details, sorted by score.
async fn refresh(source: &dyn StorySource, fan_out: &FanOut) -> Result<Vec<Story>, StoryError> {
    let ids = source.best_story_ids().await?;
    if ids.is_empty() {
        debug!("upstream returned an empty ranking");
        return Ok(Vec::new());
    }
    debug!(ids = ids.len(), "fetching story details");
    Ok(fan_out.fetch_all(&ids).await)
}
