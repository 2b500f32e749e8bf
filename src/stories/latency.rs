//! Read-latency histograms, split by cache hits and refreshes.

use crate::stories::cache::CacheOutcome;
use hdrhistogram::{CreationError, Histogram};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Largest trackable latency, in microseconds. Slower reads are recorded as
/// this value.
const HIGHEST_TRACKABLE_US: u64 = 60 * 60 * 1_000_000;
const SIGNIFICANT_FIGURES: u8 = 3;

fn new_histogram() -> Result<Histogram<u64>, CreationError> {
    Histogram::new_with_bounds(1, HIGHEST_TRACKABLE_US, SIGNIFICANT_FIGURES)
}

fn distribution(histogram: &Histogram<u64>) -> Distribution {
    if histogram.is_empty() {
        return Distribution::default();
    }
    Distribution {
        count: histogram.len(),
        min_us: histogram.min(),
        max_us: histogram.max(),
        mean_us: histogram.mean().round() as u64,
        p50_us: histogram.value_at_quantile(0.50),
        p90_us: histogram.value_at_quantile(0.90),
        p99_us: histogram.value_at_quantile(0.99),
        p999_us: histogram.value_at_quantile(0.999),
    }
}

/// Summary of one bucket, in microseconds. Values carry the histogram's
/// three significant figures of precision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
    pub p999_us: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyReport {
    /// Reads served from a fresh cache entry.
    pub cache_hit: Distribution,
    /// Reads that ran an upstream refresh.
    pub cache_miss: Distribution,
}

impl LatencyReport {
    pub fn log(&self) {
        for (bucket, d) in [("cache_hit", &self.cache_hit), ("cache_miss", &self.cache_miss)] {
            info!(
                bucket,
                count = d.count,
                min_us = d.min_us,
                p50_us = d.p50_us,
                p90_us = d.p90_us,
                p99_us = d.p99_us,
                p999_us = d.p999_us,
                max_us = d.max_us,
                mean_us = d.mean_us,
                "read latency"
            );
        }
    }
}

/// Latency histograms for the read path. Purely observational: recording
/// cannot fail and never blocks on anything but a short critical section.
#[derive(Debug)]
pub struct LatencyRecorder {
    hit: Mutex<Histogram<u64>>,
    miss: Mutex<Histogram<u64>>,
}

impl LatencyRecorder {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            hit: Mutex::new(new_histogram()?),
            miss: Mutex::new(new_histogram()?),
        })
    }

    pub fn record(&self, outcome: CacheOutcome, elapsed: Duration) {
        match outcome {
            CacheOutcome::Hit => self.record_hit(elapsed),
            CacheOutcome::Miss => self.record_miss(elapsed),
        }
    }

    pub fn record_hit(&self, elapsed: Duration) {
        record(&self.hit, elapsed);
    }

    pub fn record_miss(&self, elapsed: Duration) {
        record(&self.miss, elapsed);
    }

    /// Snapshot both buckets without clearing them.
    pub fn summarize(&self) -> LatencyReport {
        LatencyReport {
            cache_hit: distribution(&lock(&self.hit)),
            cache_miss: distribution(&lock(&self.miss)),
        }
    }

    /// Snapshot both buckets, then clear them for the next window.
    pub fn take_report(&self) -> LatencyReport {
        LatencyReport {
            cache_hit: take(&self.hit),
            cache_miss: take(&self.miss),
        }
    }

    pub fn reset(&self) {
        lock(&self.hit).reset();
        lock(&self.miss).reset();
    }
}

// A panic while holding the lock cannot leave a histogram inconsistent.
fn lock(histogram: &Mutex<Histogram<u64>>) -> MutexGuard<'_, Histogram<u64>> {
    histogram.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record(histogram: &Mutex<Histogram<u64>>, elapsed: Duration) {
    let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    lock(histogram).saturating_record(micros);
}

fn take(histogram: &Mutex<Histogram<u64>>) -> Distribution {
    let mut histogram = lock(histogram);
    let d = distribution(&histogram);
    histogram.reset();
    d
}

/// Log and reset the latency report every `interval` until `shutdown` fires,
/// then log whatever the last window collected.
pub fn spawn_reporter(
    recorder: Arc<LatencyRecorder>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip the immediate first tick
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => recorder.take_report().log(),
            }
        }
        recorder.take_report().log();
    })
}
