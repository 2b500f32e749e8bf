//! Single-slot TTL cache with single-flight refresh.
//!
//! Reads of a fresh entry go through a `watch` channel and never touch the
//! refresh lock. On a miss, callers queue on a mutex; the first one spawns
//! the loader and every later caller re-checks the slot once it gets the
//! lock, so at most one loader runs at a time.
//!
//! The loader runs in its own task that owns the lock guard. A caller that
//! gives up (cancellation, dropped request) only stops waiting; the refresh
//! still completes and populates the slot for everyone else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Whether a read was served from the cache or had to run the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError<E> {
    #[error("cancelled while waiting for the cache")]
    Cancelled,
    #[error("cache refresh task aborted")]
    Aborted(#[source] JoinError),
    #[error(transparent)]
    Load(E),
}

/// A stored value with its insertion time. Replaced wholesale on refresh.
#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

type Slot<T> = watch::Sender<Option<Arc<CacheEntry<T>>>>;

pub struct SingleFlightCache<T> {
    slot: Arc<Slot<T>>,
    refresh_lock: Arc<Mutex<()>>,
    ttl: Duration,
}

impl<T> SingleFlightCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            slot: Arc::new(tx),
            refresh_lock: Arc::new(Mutex::new(())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if present and within its TTL.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .borrow()
            .as_ref()
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    pub fn is_populated(&self) -> bool {
        self.get().is_some()
    }

    /// Time since the stored entry was inserted, fresh or not.
    pub fn entry_age(&self) -> Option<Duration> {
        self.slot
            .borrow()
            .as_ref()
            .map(|entry| entry.inserted_at.elapsed())
    }

    /// Drop the stored entry so the next read refreshes.
    pub fn invalidate(&self) {
        self.slot.send_replace(None);
        debug!("cache entry invalidated");
    }

    /// Return the cached value, or run `loader` to produce and store one.
    ///
    /// `loader` is invoked at most once per call and only while this cache's
    /// refresh lock is held. A loader error is returned to this caller and
    /// leaves the slot untouched. Cancelling `cancel` makes this call return
    /// [`CacheError::Cancelled`] but never aborts a running refresh.
    pub async fn get_or_refresh<F, Fut, E>(
        &self,
        cancel: &CancellationToken,
        loader: F,
    ) -> Result<(Arc<T>, CacheOutcome), CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        if let Some(value) = self.get() {
            return Ok((value, CacheOutcome::Hit));
        }

        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CacheError::Cancelled),
            guard = self.refresh_lock.clone().lock_owned() => guard,
        };

        // Another caller may have refreshed while we queued.
        if let Some(value) = self.get() {
            return Ok((value, CacheOutcome::Hit));
        }

        let slot = self.slot.clone();
        let ttl = self.ttl;
        let load = loader();
        let refresh = tokio::spawn(async move {
            let _guard = guard;
            let value = Arc::new(load.await?);
            slot.send_replace(Some(Arc::new(CacheEntry {
                value: value.clone(),
                inserted_at: Instant::now(),
                ttl,
            })));
            Ok::<_, E>(value)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("caller cancelled during refresh, refresh continues in background");
                Err(CacheError::Cancelled)
            }
            joined = refresh => match joined {
                Ok(Ok(value)) => Ok((value, CacheOutcome::Miss)),
                Ok(Err(e)) => Err(CacheError::Load(e)),
                Err(e) => Err(CacheError::Aborted(e)),
            },
        }
    }
}
