//! Story records as cached and served by this service.

use crate::hn::RawItem;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One ranked story. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub title: String,
    pub url: Option<String>,
    pub by: String,
    pub score: u32,
    pub comment_count: u32,
    /// Upstream creation time in Unix epoch seconds.
    pub time: i64,
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// Placeholder for an item whose detail fetch failed.
    pub fn degraded(id: u64, url: &str) -> Self {
        Self {
            title: format!("Failed to fetch story details for ID: {id} with url {url}"),
            url: None,
            by: String::new(),
            score: 0,
            comment_count: 0,
            time: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl From<RawItem> for Story {
    fn from(item: RawItem) -> Self {
        Self {
            created_at: epoch_to_datetime(item.time),
            title: item.title,
            url: item.url,
            by: item.by,
            score: item.score,
            comment_count: item.descendants,
            time: item.time,
        }
    }
}

/// Out-of-range epochs clamp to the nearest representable instant, so the
/// mapping stays monotonic.
fn epoch_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Wire representation returned by `GET /api/beststories`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub title: String,
    pub uri: String,
    pub posted_by: String,
    pub time: DateTime<Utc>,
    pub score: u32,
    pub comment_count: u32,
}

impl From<&Story> for StoryResponse {
    fn from(story: &Story) -> Self {
        Self {
            title: story.title.clone(),
            uri: story.url.clone().unwrap_or_default(),
            posted_by: story.by.clone(),
            time: story.created_at,
            score: story.score,
            comment_count: story.comment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> RawItem {
        RawItem {
            id: 8863,
            title: "My YC app: Dropbox".into(),
            url: Some("http://www.getdropbox.com/u/2/screencast.html".into()),
            by: "dhouston".into(),
            score: 111,
            descendants: 71,
            time: 1175714200,
        }
    }

    #[test]
    fn created_at_follows_epoch_seconds() {
        let story = Story::from(raw());
        assert_eq!(story.created_at.timestamp(), 1175714200);
        assert_eq!(story.comment_count, 71);

        let later = Story::from(RawItem {
            time: 1175714201,
            ..raw()
        });
        assert!(later.created_at > story.created_at);
    }

    #[test]
    fn out_of_range_epochs_clamp_monotonically() {
        let at = |time: i64| Story::from(RawItem { time, ..raw() }).created_at;

        assert_eq!(at(i64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(at(i64::MIN), DateTime::<Utc>::MIN_UTC);

        let times = [
            i64::MIN,
            -9_000_000_000_000,
            -1,
            0,
            1_175_714_200,
            8_000_000_000_000,
            9_000_000_000_000,
            i64::MAX,
        ];
        for pair in times.windows(2) {
            assert!(at(pair[1]) >= at(pair[0]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn degraded_story_names_id_and_url() {
        let story = Story::degraded(42, "http://hn/item/42.json");
        assert_eq!(
            story.title,
            "Failed to fetch story details for ID: 42 with url http://hn/item/42.json"
        );
        assert_eq!(story.score, 0);
        assert_eq!(story.comment_count, 0);
        assert_eq!(story.by, "");
        assert_eq!(story.url, None);
    }

    #[test]
    fn response_serializes_exact_field_set() {
        let value = serde_json::to_value(StoryResponse::from(&Story::from(raw()))).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "My YC app: Dropbox",
                "uri": "http://www.getdropbox.com/u/2/screencast.html",
                "postedBy": "dhouston",
                "time": "2007-04-04T19:16:40Z",
                "score": 111,
                "commentCount": 71
            })
        );
    }

    #[test]
    fn missing_link_serializes_as_empty_string() {
        let story = Story::from(RawItem {
            url: None,
            ..raw()
        });
        let value = serde_json::to_value(StoryResponse::from(&story)).unwrap();
        assert_eq!(value["uri"], "");
    }
}
