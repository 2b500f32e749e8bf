//! Hacker News API client.

use crate::config::Config;
use crate::hn::errors::HnApiError;
use crate::hn::json::parse_json_with_context;
use crate::hn::middleware::TracingMiddleware;
use crate::hn::models::RawItem;
use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Placeholder substituted with the item id in the item path template.
pub const ITEM_ID_PLACEHOLDER: &str = "{id}";

/// Read access to the upstream ranking and item records.
#[async_trait]
pub trait StorySource: Send + Sync {
    /// The current "best stories" ranking, best first.
    async fn best_story_ids(&self) -> Result<Vec<u64>, HnApiError>;

    /// The detail record for a single item.
    async fn story(&self, id: u64) -> Result<RawItem, HnApiError>;

    /// The URL a detail fetch for `id` is sent to.
    fn item_url(&self, id: u64) -> String;
}

/// Upstream endpoints, resolved from configuration.
#[derive(Debug, Clone)]
pub struct HnEndpoints {
    pub base_url: String,
    pub best_stories_path: String,
    pub item_path: String,
}

impl HnEndpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.hn_base_url.trim_end_matches('/').to_string(),
            best_stories_path: config.hn_best_stories_path.clone(),
            item_path: config.hn_item_path.clone(),
        }
    }

    pub fn best_stories_url(&self) -> String {
        format!("{}{}", self.base_url, self.best_stories_path)
    }

    pub fn item_url(&self, id: u64) -> String {
        let path = self.item_path.replace(ITEM_ID_PLACEHOLDER, &id.to_string());
        format!("{}{}", self.base_url, path)
    }
}

/// [`StorySource`] backed by the public Hacker News REST API.
pub struct HackerNewsClient {
    http: ClientWithMiddleware,
    endpoints: HnEndpoints,
}

impl HackerNewsClient {
    pub fn new(endpoints: HnEndpoints, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http: ClientBuilder::new(http).with(TracingMiddleware).build(),
            endpoints,
        })
    }

    /// GET `url` and decode the body. A JSON `null` body decodes to `None`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, HnApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| HnApiError::RequestFailed {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HnApiError::BadStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HnApiError::RequestFailed {
                url: url.to_owned(),
                source: e.into(),
            })?;

        parse_json_with_context::<Option<T>>(&body).map_err(|source| HnApiError::ParseFailed {
            url: url.to_owned(),
            source,
        })
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn best_story_ids(&self) -> Result<Vec<u64>, HnApiError> {
        let url = self.endpoints.best_stories_url();
        Ok(self.get_json::<Vec<u64>>(&url).await?.unwrap_or_default())
    }

    async fn story(&self, id: u64) -> Result<RawItem, HnApiError> {
        let url = self.endpoints.item_url(id);
        self.get_json::<RawItem>(&url)
            .await?
            .ok_or(HnApiError::Missing { id })
    }

    fn item_url(&self, id: u64) -> String {
        self.endpoints.item_url(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> HnEndpoints {
        HnEndpoints {
            base_url: "https://hacker-news.firebaseio.com/v0".into(),
            best_stories_path: "/beststories.json".into(),
            item_path: "/item/{id}.json".into(),
        }
    }

    #[test]
    fn builds_best_stories_url() {
        assert_eq!(
            endpoints().best_stories_url(),
            "https://hacker-news.firebaseio.com/v0/beststories.json"
        );
    }

    #[test]
    fn substitutes_item_id() {
        assert_eq!(
            endpoints().item_url(8863),
            "https://hacker-news.firebaseio.com/v0/item/8863.json"
        );
    }

    #[test]
    fn from_config_strips_trailing_slash() {
        let config = Config {
            hn_base_url: "http://localhost:9000/v0/".into(),
            ..Config::default()
        };
        let endpoints = HnEndpoints::from_config(&config);
        assert_eq!(endpoints.item_url(1), "http://localhost:9000/v0/item/1.json");
    }
}
