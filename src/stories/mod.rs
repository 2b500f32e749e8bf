//! Best-stories aggregation: upstream fan-out, ordering, single-flight
//! caching and read-latency tracking.

pub mod cache;
pub mod detail;
pub mod fanout;
pub mod latency;
pub mod models;
pub mod service;

pub use cache::{CacheError, CacheOutcome, SingleFlightCache};
pub use detail::{Detail, DetailFetcher};
pub use fanout::FanOut;
pub use latency::{LatencyRecorder, LatencyReport};
pub use models::{Story, StoryResponse};
pub use service::{StoryError, StoryService};
