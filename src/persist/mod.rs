pub mod memory;
pub mod sqlite;
pub mod types;
pub use types::*;

use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::market_data::types::{
    Asset, AssetListSnapshot, AssetSnapshot, GlobalStats, GlobalStatsSnapshot,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Backing storage for the freshness cache.
///
/// Per-key reads and writes are atomic; nothing stronger is promised.
/// Upserts overwrite unconditionally and stamp every record with `at`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// All stored assets, highest market cap first.
    async fn get_assets(&self) -> PersistResult<Vec<AssetSnapshot>>;

    async fn get_asset(&self, id: &str) -> PersistResult<Option<AssetSnapshot>>;

    /// Insert or replace by id. Later entries in `assets` win over earlier
    /// ones with the same id. Returns the stamped records in input order.
    async fn upsert_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<Vec<AssetSnapshot>>;

    /// The last stored top-asset ranking, each entry resolved to its current
    /// asset record. Absent until a ranking has been written.
    async fn get_top_assets(&self) -> PersistResult<Option<AssetListSnapshot>>;

    /// Upsert every asset and replace the ranking with `assets` in order,
    /// stamping the list itself with `at`.
    async fn replace_top_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<AssetListSnapshot>;

    async fn get_market_stats(&self) -> PersistResult<Option<GlobalStatsSnapshot>>;

    async fn upsert_market_stats(
        &self,
        stats: &GlobalStats,
        at: DateTime<Utc>,
    ) -> PersistResult<GlobalStatsSnapshot>;
}

/// Order by market cap, highest first.
pub(crate) fn sort_by_market_cap(assets: &mut [AssetSnapshot]) {
    assets.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap));
}

/// Stamp a fetched ranking. The first occurrence of an id fixes its
/// position; the last record for that id supplies the values.
pub(crate) fn stamp_ranking(assets: &[Asset], at: DateTime<Utc>) -> AssetListSnapshot {
    let mut latest: AHashMap<&str, &Asset> = AHashMap::with_capacity(assets.len());
    for asset in assets {
        latest.insert(asset.id.as_str(), asset);
    }

    let mut seen = AHashSet::with_capacity(assets.len());
    let ranked = assets
        .iter()
        .filter(|a| seen.insert(a.id.as_str()))
        .map(|a| {
            let values = latest.get(a.id.as_str()).copied().unwrap_or(a);
            values.clone().stamp(at)
        })
        .collect();

    AssetListSnapshot { assets: ranked, last_updated: at }
}
