use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{
    error::UpstreamError,
    store::{CacheSnapshot, CacheStore},
    upstream::CatalogSource,
};

type RefreshOutcome = Result<Arc<CacheSnapshot>, UpstreamError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Snapshot handed out by the coordinator.
#[derive(Debug, Clone)]
pub struct Freshness {
    /// Snapshot the caller should answer from.
    pub snapshot: Arc<CacheSnapshot>,
    /// Set when a refresh failed and an expired snapshot is served instead.
    pub served_stale: bool,
}

impl Freshness {
    fn fresh(snapshot: Arc<CacheSnapshot>) -> Self {
        Self {
            snapshot,
            served_stale: false,
        }
    }
}

/// Decides when the catalog must be refetched and keeps at most one upstream
/// fetch in flight.
///
/// Concurrent callers that find the cache stale attach to the pending refresh
/// instead of starting their own; all of them observe the same outcome. The
/// refresh runs as its own task and finishes even if every caller goes away.
pub struct RefreshCoordinator {
    store: Arc<CacheStore>,
    source: Arc<dyn CatalogSource>,
    pending: Arc<Mutex<Option<PendingRefresh>>>,
}

impl RefreshCoordinator {
    /// Coordinate refreshes of `store` from `source`.
    pub fn new(store: Arc<CacheStore>, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            store,
            source,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Return a usable snapshot, refreshing first when the cache is empty or stale.
    pub async fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<Freshness, UpstreamError> {
        let current = self.store.read();
        if is_usable(&current, now) {
            debug!(
                "serving cached catalog ({} games, expires in {} minutes)",
                current.len(),
                current.remaining(now).num_minutes()
            );
            return Ok(Freshness::fresh(current));
        }

        info!("catalog cache expired or empty, refreshing");
        self.refresh(now, false).await
    }

    /// Refetch the catalog even if the current snapshot is fresh. Joins a refresh
    /// that is already in flight instead of starting a second one.
    pub async fn force_refresh(&self, now: DateTime<Utc>) -> Result<Freshness, UpstreamError> {
        info!("forcing catalog refresh");
        self.refresh(now, true).await
    }

    async fn refresh(&self, now: DateTime<Utc>, forced: bool) -> Result<Freshness, UpstreamError> {
        let flight = {
            let mut pending = self.pending.lock();
            match pending.as_ref().cloned() {
                Some(flight) => {
                    debug!("joining in-flight catalog refresh");
                    flight
                }
                None => {
                    // A refresh may have completed between our read and taking the slot.
                    let latest = self.store.read();
                    if !forced && is_usable(&latest, now) {
                        return Ok(Freshness::fresh(latest));
                    }
                    let flight = self.start(now);
                    *pending = Some(flight.clone());
                    flight
                }
            }
        };

        match flight.await {
            Ok(snapshot) => Ok(Freshness::fresh(snapshot)),
            Err(err) => {
                let fallback = self.store.read();
                if fallback.is_empty() {
                    warn!("catalog refresh failed with no fallback: {err}");
                    return Err(err);
                }
                warn!(
                    "catalog refresh failed, serving stale snapshot of {} games: {err}",
                    fallback.len()
                );
                Ok(Freshness {
                    snapshot: fallback,
                    served_stale: true,
                })
            }
        }
    }

    fn start(&self, now: DateTime<Utc>) -> PendingRefresh {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);

        let slot = Arc::clone(&pending);
        let task = tokio::spawn(async move {
            let outcome = source
                .fetch_catalog()
                .await
                .map(|records| store.replace(records, now));
            if let Ok(snapshot) = &outcome {
                info!("cached {} games from upstream catalog", snapshot.len());
            }
            // The snapshot is installed before the slot is released, so a caller that
            // finds the slot empty also finds the new snapshot.
            slot.lock().take();
            outcome
        });

        task.map(move |joined| {
            joined.unwrap_or_else(|err| {
                // The task never reached its own cleanup.
                pending.lock().take();
                Err(UpstreamError::Transport(format!(
                    "catalog refresh task failed: {err}"
                )))
            })
        })
        .boxed()
        .shared()
    }
}

fn is_usable(snapshot: &CacheSnapshot, now: DateTime<Utc>) -> bool {
    !snapshot.is_empty() && !snapshot.is_stale(now)
}
