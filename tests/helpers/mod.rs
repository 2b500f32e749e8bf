//! A fake Hacker News API served on an ephemeral local port.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use beststories::config::Config;
use beststories::hn::{HackerNewsClient, HnEndpoints};
use beststories::stories::{LatencyRecorder, StoryService};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct FakeHn {
    /// `None` makes the ranking endpoint answer 503.
    ids: Mutex<Option<Vec<u64>>>,
    /// Served verbatim from the ranking endpoint when set.
    raw_ranking: Mutex<Option<&'static str>>,
    items: Mutex<HashMap<u64, Value>>,
    broken: Mutex<HashSet<u64>>,
    delay: Mutex<Duration>,
    list_calls: AtomicUsize,
    item_calls: AtomicUsize,
}

impl FakeHn {
    /// Rank `stories` in the given order, each as `(id, score)`.
    pub fn with_stories(stories: &[(u64, u32)]) -> Arc<Self> {
        let fake = Arc::new(Self::default());
        fake.set_ids(Some(stories.iter().map(|(id, _)| *id).collect()));
        for &(id, score) in stories {
            fake.put_item(id, story_json(id, score));
        }
        fake
    }

    pub fn set_ids(&self, ids: Option<Vec<u64>>) {
        *self.ids.lock().unwrap() = ids;
    }

    pub fn set_raw_ranking(&self, body: &'static str) {
        *self.raw_ranking.lock().unwrap() = Some(body);
    }

    pub fn put_item(&self, id: u64, value: Value) {
        self.items.lock().unwrap().insert(id, value);
    }

    /// Make `/item/{id}.json` answer 500.
    pub fn break_item(&self, id: u64) {
        self.broken.lock().unwrap().insert(id);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }

    fn delay(&self) -> Duration {
        *self.delay.lock().unwrap()
    }
}

pub fn story_json(id: u64, score: u32) -> Value {
    json!({
        "by": format!("user{id}"),
        "descendants": id * 2,
        "id": id,
        "kids": [],
        "score": score,
        "time": 1_700_000_000 + id,
        "title": format!("Story {id}"),
        "type": "story",
        "url": format!("https://example.com/{id}")
    })
}

async fn best_stories(State(fake): State<Arc<FakeHn>>) -> Response {
    fake.list_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(fake.delay()).await;
    if let Some(body) = *fake.raw_ranking.lock().unwrap() {
        return ([(axum::http::header::CONTENT_TYPE, "application/json")], body).into_response();
    }
    let ids = fake.ids.lock().unwrap().clone();
    match ids {
        Some(ids) => Json(ids).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn item(State(fake): State<Arc<FakeHn>>, Path(file): Path<String>) -> Response {
    fake.item_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(fake.delay()).await;
    let Some(id) = file.strip_suffix(".json").and_then(|s| s.parse::<u64>().ok()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if fake.broken.lock().unwrap().contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    // Upstream answers `null` for ids it does not know.
    let value = fake.items.lock().unwrap().get(&id).cloned();
    Json(value.unwrap_or(Value::Null)).into_response()
}

/// Serve `fake` and return its base URL (`http://127.0.0.1:port/v0`).
pub async fn serve(fake: Arc<FakeHn>) -> String {
    let router = Router::new()
        .route("/v0/beststories.json", get(best_stories))
        .route("/v0/item/{file}", get(item))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v0")
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        hn_base_url: base_url.to_string(),
        max_concurrent_requests: 4,
        cache_ttl: Duration::from_secs(60),
        upstream_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn service_for(config: &Config) -> Arc<StoryService> {
    let client =
        HackerNewsClient::new(HnEndpoints::from_config(config), config.upstream_timeout).unwrap();
    Arc::new(StoryService::new(
        Arc::new(client),
        config.max_concurrent_requests,
        config.cache_ttl,
        Arc::new(LatencyRecorder::new().unwrap()),
        CancellationToken::new(),
    ))
}

/// A running fake upstream plus a service pointed at it.
pub async fn setup(stories: &[(u64, u32)]) -> (Arc<FakeHn>, Arc<StoryService>, String) {
    let fake = FakeHn::with_stories(stories);
    let base_url = serve(fake.clone()).await;
    let service = service_for(&config_for(&base_url));
    (fake, service, base_url)
}
