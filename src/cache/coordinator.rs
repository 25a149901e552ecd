//! Read-through orchestration.
//!
//! Every entity kind goes through the same steps: look the entry up, serve
//! it when it is within the TTL, otherwise fetch from upstream, store and
//! serve. A failed fetch leaves the store untouched and the error travels
//! back to the caller unchanged. Concurrent misses for the same key are not
//! coalesced; both fetch and the last write wins.
//!
//! Charts are not cached. They are synthesized on every request from the
//! asset's snapshot, which is itself read through the cache.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument, warn};

use super::error::{CoordinatorError, CoordinatorResult};
use super::freshness::FreshnessCache;
use crate::market_data::adapters::MarketDataSource;
use crate::market_data::chart;
use crate::market_data::types::{AssetSnapshot, ChartPoint, GlobalStatsSnapshot};

pub const TOP_ASSETS_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Hit,
    MissRefreshed,
    MissFailed,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Hit => "hit",
            Outcome::MissRefreshed => "miss_refreshed",
            Outcome::MissFailed => "miss_failed",
        }
    }
}

fn record_lookup(kind: &'static str, key: &str, outcome: Outcome) {
    debug!(kind, key, outcome = outcome.as_str(), "Cache lookup");
    metrics::counter!(
        "coinboard_cache_lookups_total",
        "kind" => kind,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Asset ids are lowercase slugs. Trims, lowercases and rejects anything
/// that could not be a provider id.
pub fn normalize_asset_id(raw: &str) -> CoordinatorResult<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(CoordinatorError::InvalidRequest("Crypto ID is required".into()));
    }
    let valid = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(CoordinatorError::InvalidRequest(format!("invalid crypto id {id:?}")));
    }
    Ok(id.to_ascii_lowercase())
}

pub struct CacheCoordinator {
    cache: FreshnessCache,
    source: Arc<dyn MarketDataSource>,
    // Held only for the synchronous synthesis step, never across an await.
    rng: Mutex<StdRng>,
    top_limit: usize,
}

impl CacheCoordinator {
    pub fn new(cache: FreshnessCache, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            cache,
            source,
            rng: Mutex::new(StdRng::from_entropy()),
            top_limit: TOP_ASSETS_LIMIT,
        }
    }

    /// Replace the chart noise source, e.g. with a fixed seed in tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_top_limit(mut self, limit: usize) -> Self {
        self.top_limit = limit;
        self
    }

    /// Top assets by market cap.
    #[instrument(skip(self))]
    pub async fn top_assets(&self) -> CoordinatorResult<Vec<AssetSnapshot>> {
        if let Some(entry) = self.cache.get_asset_list().await? {
            if self.cache.is_fresh(&entry) {
                record_lookup("asset_list", "top", Outcome::Hit);
                return Ok(entry.value.into_iter().take(self.top_limit).collect());
            }
        }

        let fetched = match self.source.fetch_top_assets(self.top_limit).await {
            Ok(assets) => assets,
            Err(e) => {
                record_lookup("asset_list", "top", Outcome::MissFailed);
                warn!(kind = "asset_list", error = %e, "Refresh failed");
                return Err(e.into());
            }
        };

        let stored = self.cache.put_asset_list(&fetched).await?;
        record_lookup("asset_list", "top", Outcome::MissRefreshed);
        Ok(stored.assets.into_iter().take(self.top_limit).collect())
    }

    /// Single asset by id.
    #[instrument(skip(self))]
    pub async fn asset(&self, id: &str) -> CoordinatorResult<AssetSnapshot> {
        let id = normalize_asset_id(id)?;

        if let Some(entry) = self.cache.get_asset(&id).await? {
            if self.cache.is_fresh(&entry) {
                record_lookup("asset", &id, Outcome::Hit);
                return Ok(entry.value);
            }
        }

        self.refresh_asset(&id).await
    }

    async fn refresh_asset(&self, id: &str) -> CoordinatorResult<AssetSnapshot> {
        let mut fetched = match self.source.fetch_asset_by_id(id).await {
            Ok(asset) => asset,
            Err(e) => {
                record_lookup("asset", id, Outcome::MissFailed);
                warn!(kind = "asset", id, error = %e, "Refresh failed");
                return Err(e.into());
            }
        };

        // Keyed by what callers ask for, so the next lookup of `id` hits.
        if fetched.id != id {
            warn!(requested = id, returned = %fetched.id, "Upstream answered with a different id");
            fetched.id = id.to_string();
        }

        let mut stored = self.cache.put_assets(std::slice::from_ref(&fetched)).await?;
        record_lookup("asset", id, Outcome::MissRefreshed);
        stored
            .pop()
            .ok_or_else(|| CoordinatorError::AssetNotFound(id.to_string()))
    }

    /// Synthetic price history over `days`, seeded by the asset's snapshot.
    #[instrument(skip(self))]
    pub async fn chart(&self, id: &str, days: u32) -> CoordinatorResult<Vec<ChartPoint>> {
        let id = normalize_asset_id(id)?;
        if days == 0 {
            return Err(CoordinatorError::InvalidRequest("days must be at least 1".into()));
        }

        let seed = self.chart_seed(&id).await?;

        let now = self.cache.now();
        let points = {
            let mut rng = self.rng.lock();
            chart::synthesize(&mut *rng, seed.price, seed.price_change_24h, days, now)
        };
        debug!(id = %id, days, points = points.len(), "Synthesized chart");
        Ok(points)
    }

    // A fresh snapshot seeds directly. Otherwise the asset is refreshed; if
    // upstream does not know the id, or no snapshot can be had at all, the
    // asset is not found. A stale snapshot still seeds the chart when the
    // refresh fails for any other reason.
    async fn chart_seed(&self, id: &str) -> CoordinatorResult<AssetSnapshot> {
        let stale = match self.cache.get_asset(id).await? {
            Some(entry) if self.cache.is_fresh(&entry) => {
                record_lookup("asset", id, Outcome::Hit);
                return Ok(entry.value);
            }
            other => other,
        };

        let err = match self.refresh_asset(id).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(CoordinatorError::Upstream(e)) => e,
            Err(other) => return Err(other),
        };

        if err.is_not_found() {
            return Err(CoordinatorError::AssetNotFound(id.to_string()));
        }
        match stale {
            Some(entry) => {
                warn!(id, error = %err, "Seeding chart from stale snapshot");
                Ok(entry.value)
            }
            None => Err(CoordinatorError::AssetNotFound(id.to_string())),
        }
    }

    /// Global market statistics.
    #[instrument(skip(self))]
    pub async fn market_stats(&self) -> CoordinatorResult<GlobalStatsSnapshot> {
        if let Some(entry) = self.cache.get_market_stats().await? {
            if self.cache.is_fresh(&entry) {
                record_lookup("global_stats", "global", Outcome::Hit);
                return Ok(entry.value);
            }
        }

        let fetched = match self.source.fetch_global_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                record_lookup("global_stats", "global", Outcome::MissFailed);
                warn!(kind = "global_stats", error = %e, "Refresh failed");
                return Err(e.into());
            }
        };

        let stored = self.cache.put_market_stats(&fetched).await?;
        record_lookup("global_stats", "global", Outcome::MissRefreshed);
        Ok(stored)
    }
}
