#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use coinboard_rs::cache::{CacheCoordinator, FreshnessCache, DEFAULT_TTL};
use coinboard_rs::clock::ManualClock;
use coinboard_rs::market_data::adapters::MarketDataSource;
use coinboard_rs::market_data::{Asset, GlobalStats, MarketDataError};
use coinboard_rs::persist::{MemoryStore, SnapshotStore};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status(u16),
    Malformed,
}

impl Failure {
    fn to_error(self, entity: &str) -> MarketDataError {
        match self {
            Failure::Status(code) => MarketDataError::unavailable(Some(code), format!("status {code}")),
            Failure::Malformed => MarketDataError::malformed(entity, "missing field"),
        }
    }
}

/// In-process stand-in for the upstream provider. Counts every call.
#[derive(Default)]
pub struct FakeSource {
    pub assets: Mutex<Vec<Asset>>,
    pub stats: Mutex<Option<GlobalStats>>,
    pub failure: Mutex<Option<Failure>>,
    // requested id -> id the provider answers with
    pub aliases: Mutex<Vec<(String, String)>>,
    pub top_calls: AtomicUsize,
    pub by_id_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_assets(assets: Vec<Asset>) -> Self {
        Self {
            assets: Mutex::new(assets),
            stats: Mutex::new(Some(global_stats(2.5e12))),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, failure: Failure) {
        *self.failure.lock() = Some(failure);
    }

    pub fn alias(&self, requested: &str, canonical: &str) {
        self.aliases.lock().push((requested.to_string(), canonical.to_string()));
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn set_price(&self, id: &str, price: f64) {
        for a in self.assets.lock().iter_mut().filter(|a| a.id == id) {
            a.price = price;
        }
    }

    pub fn calls(&self) -> usize {
        self.top_calls.load(Ordering::SeqCst)
            + self.by_id_calls.load(Ordering::SeqCst)
            + self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, MarketDataError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = *self.failure.lock() {
            return Err(f.to_error("top_assets"));
        }
        Ok(self.assets.lock().iter().take(limit).cloned().collect())
    }

    async fn fetch_asset_by_id(&self, id: &str) -> Result<Asset, MarketDataError> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        let entity = format!("asset:{id}");
        if let Some(f) = *self.failure.lock() {
            return Err(f.to_error(&entity));
        }
        let id = self
            .aliases
            .lock()
            .iter()
            .find(|(requested, _)| requested == id)
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or_else(|| id.to_string());
        self.assets
            .lock()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| MarketDataError::unavailable(Some(404), "coin not found"))
    }

    async fn fetch_global_stats(&self) -> Result<GlobalStats, MarketDataError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = *self.failure.lock() {
            return Err(f.to_error("global_stats"));
        }
        self.stats
            .lock()
            .clone()
            .ok_or_else(|| MarketDataError::unavailable(Some(500), "no stats"))
    }
}

pub fn asset(id: &str, symbol: &str, price: f64, change: f64, market_cap: f64) -> Asset {
    Asset {
        id: id.to_string(),
        name: id.to_string(),
        symbol: symbol.to_string(),
        price,
        price_change_24h: change,
        market_cap,
        volume_24h: market_cap / 20.0,
        image: format!("https://img.example/{id}.png"),
    }
}

pub fn sample_assets() -> Vec<Asset> {
    vec![
        asset("bitcoin", "BTC", 50_000.0, 10.0, 9.8e11),
        asset("ethereum", "ETH", 3_000.0, -2.5, 3.6e11),
        asset("tether", "USDT", 1.0, 0.0, 1.1e11),
    ]
}

pub fn global_stats(total_market_cap: f64) -> GlobalStats {
    GlobalStats {
        total_market_cap,
        total_volume: 9.0e10,
        btc_dominance: 52.0,
        active_cryptos: 13_000,
    }
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub coordinator: Arc<CacheCoordinator>,
}

pub fn harness_with(source: FakeSource, seed: u64) -> Harness {
    let source = Arc::new(source);
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(epoch());

    let cache = FreshnessCache::new(
        store.clone() as Arc<dyn SnapshotStore>,
        Arc::new(clock.clone()),
        DEFAULT_TTL,
    );
    let coordinator = CacheCoordinator::new(cache, source.clone() as Arc<dyn MarketDataSource>)
        .with_rng(StdRng::seed_from_u64(seed));

    Harness { source, store, clock, coordinator: Arc::new(coordinator) }
}

pub fn harness() -> Harness {
    harness_with(FakeSource::with_assets(sample_assets()), 7)
}
