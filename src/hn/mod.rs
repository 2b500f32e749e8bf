//! Client for the upstream Hacker News content API.

pub mod api;
pub mod errors;
pub mod json;
pub mod middleware;
pub mod models;

pub use api::{HackerNewsClient, HnEndpoints, StorySource};
pub use errors::HnApiError;
pub use models::RawItem;
