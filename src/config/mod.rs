//! Application configuration, loaded from the environment.
//!
//! Durations accept either bare integer seconds (`120`) or humanized strings
//! (`2m`, `90s`, `1h`).

use crate::hn::api::ITEM_ID_PLACEHOLDER;
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base level for this crate's logs; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_hn_base_url")]
    pub hn_base_url: String,
    #[serde(default = "default_hn_best_stories_path")]
    pub hn_best_stories_path: String,
    /// Item detail path; `{id}` is replaced with the item id.
    #[serde(default = "default_hn_item_path")]
    pub hn_item_path: String,

    /// Upper bound on concurrent detail requests within one refresh.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(
        default = "default_cache_ttl",
        deserialize_with = "deserialize_duration"
    )]
    pub cache_ttl: Duration,
    /// Per-request timeout applied to every upstream call.
    #[serde(
        default = "default_upstream_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub upstream_timeout: Duration,
    /// Timeout for an inbound HTTP request as a whole.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    #[serde(
        default = "default_latency_report_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub latency_report_interval: Duration,
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    /// Mounts `DELETE /api/cache` and allows `GET /api/latency?reset=true`.
    #[serde(default)]
    pub enable_admin_ops: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HN_BASE_URL is not a valid absolute URL: {0}")]
    InvalidBaseUrl(String),
    #[error("HN_ITEM_PATH must contain the `{{id}}` placeholder, got {0:?}")]
    MissingItemPlaceholder(String),
    #[error("MAX_CONCURRENT_REQUESTS must be at least 1")]
    ZeroConcurrency,
    #[error("CACHE_TTL must be greater than zero")]
    ZeroCacheTtl,
}

impl Config {
    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.hn_base_url) {
            Ok(url) if !url.cannot_be_a_base() => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.hn_base_url.clone())),
        }
        if !self.hn_item_path.contains(ITEM_ID_PLACEHOLDER) {
            return Err(ConfigError::MissingItemPlaceholder(
                self.hn_item_path.clone(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::ZeroCacheTtl);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            port: default_port(),
            hn_base_url: default_hn_base_url(),
            hn_best_stories_path: default_hn_best_stories_path(),
            hn_item_path: default_hn_item_path(),
            max_concurrent_requests: default_max_concurrent_requests(),
            cache_ttl: default_cache_ttl(),
            upstream_timeout: default_upstream_timeout(),
            request_timeout: default_request_timeout(),
            latency_report_interval: default_latency_report_interval(),
            shutdown_timeout: default_shutdown_timeout(),
            enable_admin_ops: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_hn_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_hn_best_stories_path() -> String {
    "/beststories.json".to_string()
}

fn default_hn_item_path() -> String {
    "/item/{id}.json".to_string()
}

fn default_max_concurrent_requests() -> usize {
    16
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_latency_report_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

/// Parse a humanized duration string such as `2m` or `250ms`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let parser = DurationParser::with_all_time_units();
    let parsed = parser
        .parse(value.trim())
        .map_err(|e| format!("invalid duration {value:?}: {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration {value:?}: {e}"))
}

/// Accepts integer seconds or a humanized string.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl serde::de::Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a duration as integer seconds or a string like \"2m\"")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must not be negative"))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Duration, E> {
            parse_duration(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
