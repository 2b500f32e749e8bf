//! Concurrent detail fan-out and score ordering.

use crate::stories::detail::{Detail, DetailFetcher};
use crate::stories::models::Story;
use crate::utils::fmt_duration;
use futures::StreamExt;
use futures::stream;
use std::time::Instant;
use tracing::{debug, warn};

/// Fetches details for a ranking of ids, at most `max_concurrency` at a time.
#[derive(Clone)]
pub struct FanOut {
    fetcher: DetailFetcher,
    max_concurrency: usize,
}

impl FanOut {
    pub fn new(fetcher: DetailFetcher, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetch every id and return the stories sorted by score, highest first.
    ///
    /// Failed fetches are included as degraded placeholders. Fetches complete
    /// in any order; results are put back in upstream ranking order before a
    /// stable sort, so equal scores keep their ranking order.
    pub async fn fetch_all(&self, ids: &[u64]) -> Vec<Story> {
        if ids.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        let mut details: Vec<(usize, Detail)> = stream::iter(ids.iter().copied().enumerate())
            .map(|(rank, id)| async move { (rank, self.fetcher.fetch(id).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        details.sort_unstable_by_key(|(rank, _)| *rank);

        let degraded = details.iter().filter(|(_, d)| d.is_degraded()).count();
        let mut stories: Vec<Story> = details.into_iter().map(|(_, d)| d.into_story()).collect();
        stories.sort_by(|a, b| b.score.cmp(&a.score));

        if degraded > 0 {
            warn!(
                total = stories.len(),
                degraded,
                "some story details could not be fetched"
            );
        }
        debug!(
            total = stories.len(),
            degraded,
            concurrency = self.max_concurrency,
            elapsed = fmt_duration(start.elapsed()),
            "story fan-out complete"
        );

        stories
    }
}
