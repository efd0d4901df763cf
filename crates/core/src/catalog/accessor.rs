use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::AppConfig, models::GameRecord};

use super::{
    coordinator::{Freshness, RefreshCoordinator},
    error::{CatalogError, CatalogResult},
    store::CacheStore,
    upstream::{CatalogSource, FreeToGameClient},
};

/// A slice of the catalog together with the size of the full result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Returned games in catalog order.
    pub games: Vec<GameRecord>,
    /// Size of the whole result set the page was cut from.
    pub total: usize,
    /// Whether the page was answered from an expired snapshot.
    #[serde(skip)]
    pub served_stale: bool,
}

/// A single game returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogHit {
    /// The matching game.
    pub game: GameRecord,
    /// Whether the game was found in an expired snapshot.
    pub served_stale: bool,
}

/// Read operations over the cached upstream catalog.
///
/// Every query goes through the [`RefreshCoordinator`], so the catalog is fetched
/// on first use and refetched once the snapshot expires.
pub struct GameCatalog {
    coordinator: RefreshCoordinator,
}

impl GameCatalog {
    /// Build a catalog over `source` whose snapshots live for `ttl`.
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        let store = Arc::new(CacheStore::new(ttl));
        Self {
            coordinator: RefreshCoordinator::new(store, source),
        }
    }

    /// Build a catalog backed by the FreeToGame API as configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = FreeToGameClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.cache_ttl()))
    }

    /// A usable snapshot, or `NoData` when upstream failed with nothing cached.
    async fn snapshot_or_no_data(&self) -> CatalogResult<Freshness> {
        self.coordinator
            .ensure_fresh(Utc::now())
            .await
            .map_err(|err| {
                warn!("no catalog to answer from: {err}");
                CatalogError::NoData
            })
    }

    /// The first `limit` games plus the size of the whole catalog.
    /// A `limit` of zero or less yields no games.
    pub async fn list(&self, limit: i64) -> CatalogResult<CatalogPage> {
        let Freshness {
            snapshot,
            served_stale,
        } = self.snapshot_or_no_data().await?;

        let take = usize::try_from(limit).unwrap_or(0);
        Ok(CatalogPage {
            games: snapshot.records().iter().take(take).cloned().collect(),
            total: snapshot.len(),
            served_stale,
        })
    }

    /// One game chosen uniformly at random.
    pub async fn random_pick(&self) -> CatalogResult<CatalogHit> {
        let Freshness {
            snapshot,
            served_stale,
        } = self.snapshot_or_no_data().await?;

        let records = snapshot.records();
        if records.is_empty() {
            return Err(CatalogError::NoData);
        }
        let index = rand::rng().random_range(0..records.len());
        debug!("picked random game {} of {}", index, records.len());

        Ok(CatalogHit {
            game: records[index].clone(),
            served_stale,
        })
    }

    /// Case-insensitive substring search over title, genre and description.
    ///
    /// An empty query returns an empty page without touching the cache. When the
    /// catalog cannot be loaded the search reports no results instead of failing.
    pub async fn search(&self, query: &str) -> CatalogPage {
        if query.is_empty() {
            return CatalogPage::default();
        }

        let Freshness {
            snapshot,
            served_stale,
        } = match self.coordinator.ensure_fresh(Utc::now()).await {
            Ok(freshness) => freshness,
            Err(err) => {
                warn!("search for {query:?} found no catalog to search: {err}");
                return CatalogPage::default();
            }
        };

        let needle = query.to_lowercase();
        let games: Vec<GameRecord> = snapshot
            .records()
            .iter()
            .filter(|game| game.matches(&needle))
            .cloned()
            .collect();
        debug!("search for {query:?} found {} results", games.len());

        CatalogPage {
            total: games.len(),
            games,
            served_stale,
        }
    }

    /// Look up a game by id. A miss forces one refetch of the catalog in case the
    /// game was added upstream after the last refresh.
    ///
    /// Any failure to load the catalog is reported as `NotFound`.
    pub async fn get_by_id(&self, id: &str) -> CatalogResult<CatalogHit> {
        match self.coordinator.ensure_fresh(Utc::now()).await {
            Ok(Freshness {
                snapshot,
                served_stale,
            }) => {
                if let Some(game) = snapshot.get(id) {
                    return Ok(CatalogHit {
                        game: game.clone(),
                        served_stale,
                    });
                }
            }
            Err(err) => {
                warn!("lookup of game {id} found no catalog: {err}");
                return Err(CatalogError::NotFound(id.to_string()));
            }
        }

        debug!("game {id} not cached, forcing a catalog refresh");
        match self.coordinator.force_refresh(Utc::now()).await {
            Ok(Freshness {
                snapshot,
                served_stale,
            }) => snapshot
                .get(id)
                .map(|game| CatalogHit {
                    game: game.clone(),
                    served_stale,
                })
                .ok_or_else(|| CatalogError::NotFound(id.to_string())),
            Err(err) => {
                warn!("forced refresh for game {id} failed: {err}");
                Err(CatalogError::NotFound(id.to_string()))
            }
        }
    }
}
