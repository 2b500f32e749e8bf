//! Per-item detail fetching with failure isolation.

use crate::hn::StorySource;
use crate::stories::models::Story;
use std::sync::Arc;
use tracing::warn;

/// Result of a single detail fetch. Both variants carry a usable story.
#[derive(Debug, Clone)]
pub enum Detail {
    Fetched(Story),
    /// The fetch failed; the story is a placeholder naming the id and URL.
    Degraded(Story),
}

impl Detail {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_story(self) -> Story {
        match self {
            Self::Fetched(story) | Self::Degraded(story) => story,
        }
    }
}

/// Fetches one story's details. Never fails: upstream or decode errors
/// become a [`Story::degraded`] placeholder.
///
/// One request per call, no retries.
#[derive(Clone)]
pub struct DetailFetcher {
    source: Arc<dyn StorySource>,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn StorySource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, id: u64) -> Detail {
        match self.source.story(id).await {
            Ok(item) => Detail::Fetched(Story::from(item)),
            Err(e) => {
                let url = self.source.item_url(id);
                warn!(id, url = %url, error = %e, "story detail fetch failed, using placeholder");
                Detail::Degraded(Story::degraded(id, &url))
            }
        }
    }
}
