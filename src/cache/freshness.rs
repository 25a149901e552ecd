use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::market_data::types::{
    Asset, AssetListSnapshot, AssetSnapshot, GlobalStats, GlobalStatsSnapshot,
};
use crate::persist::{PersistResult, SnapshotStore};

/// Asset and global-stats entries are served for five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// An entry is valid up to and including the TTL boundary.
pub fn is_valid(age: Duration, ttl: Duration) -> bool {
    age <= ttl
}

/// A stored value together with how long ago it was ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub age: Duration,
}

/// TTL policy on top of a [`SnapshotStore`]. Reads never mutate; writes
/// stamp with the injected clock.
pub struct FreshnessCache {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl FreshnessCache {
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_fresh<T>(&self, entry: &Cached<T>) -> bool {
        is_valid(entry.age, self.ttl)
    }

    // Entries stamped in the future (clock moved backwards) count as age zero.
    fn age_of(&self, last_updated: DateTime<Utc>) -> Duration {
        (self.clock.now() - last_updated).to_std().unwrap_or(Duration::ZERO)
    }

    pub async fn get_asset(&self, id: &str) -> PersistResult<Option<Cached<AssetSnapshot>>> {
        Ok(self.store.get_asset(id).await?.map(|snap| Cached {
            age: self.age_of(snap.last_updated),
            value: snap,
        }))
    }

    /// The stored top-asset ranking. Its age is the age of the list itself,
    /// independent of single-asset writes to its members.
    pub async fn get_asset_list(&self) -> PersistResult<Option<Cached<Vec<AssetSnapshot>>>> {
        Ok(self.store.get_top_assets().await?.map(|list| Cached {
            age: self.age_of(list.last_updated),
            value: list.assets,
        }))
    }

    pub async fn get_market_stats(&self) -> PersistResult<Option<Cached<GlobalStatsSnapshot>>> {
        Ok(self.store.get_market_stats().await?.map(|snap| Cached {
            age: self.age_of(snap.last_updated),
            value: snap,
        }))
    }

    pub async fn put_assets(&self, assets: &[Asset]) -> PersistResult<Vec<AssetSnapshot>> {
        self.store.upsert_assets(assets, self.clock.now()).await
    }

    pub async fn put_asset_list(&self, assets: &[Asset]) -> PersistResult<AssetListSnapshot> {
        self.store.replace_top_assets(assets, self.clock.now()).await
    }

    pub async fn put_market_stats(&self, stats: &GlobalStats) -> PersistResult<GlobalStatsSnapshot> {
        self.store.upsert_market_stats(stats, self.clock.now()).await
    }
}
