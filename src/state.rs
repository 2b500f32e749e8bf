//! Application state shared across request handlers.

use crate::stories::StoryService;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub stories: Arc<StoryService>,
    pub started_at: Instant,
    /// Whether clients may invalidate the cache or reset latency stats.
    pub admin_ops: bool,
}

impl AppState {
    pub fn new(stories: Arc<StoryService>) -> Self {
        Self {
            stories,
            started_at: Instant::now(),
            admin_ops: false,
        }
    }

    pub fn with_admin_ops(mut self, enabled: bool) -> Self {
        self.admin_ops = enabled;
        self
    }
}
