use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::warn;

use crate::models::GameRecord;

/// Immutable copy of the upstream catalog at one point in time.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    records: Vec<GameRecord>,
    index: HashMap<String, usize>,
    fetched_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl CacheSnapshot {
    fn empty(ttl: Duration) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            fetched_at: None,
            ttl,
        }
    }

    fn build(records: Vec<GameRecord>, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        let mut unique = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            match index.entry(record.id.clone()) {
                Entry::Occupied(_) => {
                    warn!("dropping duplicate catalog id {}", record.id);
                }
                Entry::Vacant(slot) => {
                    slot.insert(unique.len());
                    unique.push(record);
                }
            }
        }

        Self {
            records: unique,
            index,
            fetched_at: Some(fetched_at),
            ttl,
        }
    }

    /// Records in upstream order.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time of the refresh that produced this snapshot, if any.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Exact id lookup.
    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// True once `ttl` has elapsed since the fetch, or when never fetched.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.fetched_at {
            Some(fetched_at) => now - fetched_at >= self.ttl,
            None => true,
        }
    }

    /// Time left before the snapshot turns stale.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.fetched_at
            .and_then(|fetched_at| fetched_at.checked_add_signed(self.ttl))
            .map(|expires_at| expires_at - now)
            .filter(|remaining| *remaining > Duration::zero())
            .unwrap_or_else(Duration::zero)
    }
}

/// Thread-safe holder of the current [`CacheSnapshot`].
///
/// Readers get an `Arc` to a complete snapshot and never block on a refresh;
/// [`CacheStore::replace`] swaps the whole snapshot in one step.
#[derive(Debug)]
pub struct CacheStore {
    ttl: Duration,
    current: RwLock<Arc<CacheSnapshot>>,
}

impl CacheStore {
    /// Create an empty store whose snapshots live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: RwLock::new(Arc::new(CacheSnapshot::empty(ttl))),
        }
    }

    /// Current snapshot, possibly empty or stale.
    pub fn read(&self) -> Arc<CacheSnapshot> {
        self.current.read().clone()
    }

    /// Install `records` as the new snapshot, fetched at `now`.
    pub fn replace(&self, records: Vec<GameRecord>, now: DateTime<Utc>) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(CacheSnapshot::build(records, now, self.ttl));
        *self.current.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Whether the current snapshot is stale at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.read().is_stale(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, title: &str) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            title: title.to_string(),
            genre: "MOBA".to_string(),
            platform: "PC (Windows)".to_string(),
            year: "2020".to_string(),
            description: String::new(),
            image: String::new(),
            game_url: String::new(),
            developer: String::new(),
            publisher: String::new(),
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_store_is_stale() {
        let store = CacheStore::new(Duration::hours(24));
        let snapshot = store.read();
        assert!(snapshot.is_empty());
        assert!(snapshot.fetched_at().is_none());
        assert!(store.is_stale(epoch()));
    }

    #[test]
    fn replace_is_visible_to_later_reads() {
        let store = CacheStore::new(Duration::hours(24));
        let installed = store.replace(vec![record("1", "Alpha"), record("2", "Beta")], epoch());

        let first = store.read();
        let second = store.read();
        assert!(Arc::ptr_eq(&installed, &first));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.records()[1].title, "Beta");
        assert_eq!(first.fetched_at(), Some(epoch()));

        store.replace(vec![record("3", "Gamma")], epoch());
        assert_eq!(store.read().len(), 1);
        // earlier readers keep their complete snapshot
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn staleness_boundary() {
        let ttl = Duration::hours(24);
        let store = CacheStore::new(ttl);
        store.replace(vec![record("1", "Alpha")], epoch());

        assert!(!store.is_stale(epoch()));
        assert!(!store.is_stale(epoch() + ttl - Duration::milliseconds(1)));
        assert!(store.is_stale(epoch() + ttl));
        assert!(store.is_stale(epoch() + ttl + Duration::seconds(1)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let store = CacheStore::new(Duration::hours(24));
        let snapshot = store.replace(vec![record("1", "Alpha")], epoch());

        assert_eq!(snapshot.remaining(epoch() + Duration::hours(23)), Duration::hours(1));
        assert_eq!(snapshot.remaining(epoch() + Duration::hours(30)), Duration::zero());
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let store = CacheStore::new(Duration::hours(24));
        let snapshot = store.replace(
            vec![record("1", "Alpha"), record("2", "Beta"), record("1", "Impostor")],
            epoch(),
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("1").map(|game| game.title.as_str()), Some("Alpha"));
        assert_eq!(snapshot.get("2").map(|game| game.title.as_str()), Some("Beta"));
        assert!(snapshot.get("9").is_none());
    }
}
