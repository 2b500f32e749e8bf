//! Upstream record shapes returned by the Hacker News API.

use serde::Deserialize;

/// One item as served by `/item/{id}.json`.
///
/// Upstream omits fields freely (Ask HN posts have no `url`, dead items
/// lose their `by`), so every field falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub by: String,
    pub score: u32,
    /// Total comment count for stories.
    pub descendants: u32,
    /// Creation time, Unix epoch seconds.
    pub time: i64,
}
