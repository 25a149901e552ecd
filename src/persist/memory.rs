use ahash::AHashMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{sort_by_market_cap, stamp_ranking, PersistResult, SnapshotStore};
use crate::market_data::types::{
    Asset, AssetListSnapshot, AssetSnapshot, GlobalStats, GlobalStatsSnapshot,
};

#[derive(Debug, Clone)]
struct Ranking {
    ids: Vec<String>,
    last_updated: DateTime<Utc>,
}

/// Process-local store. Contents live as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    assets: RwLock<AHashMap<String, AssetSnapshot>>,
    // lock order: `assets` before `ranking`
    ranking: RwLock<Option<Ranking>>,
    market_stats: RwLock<Option<GlobalStatsSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get_assets(&self) -> PersistResult<Vec<AssetSnapshot>> {
        let mut all: Vec<AssetSnapshot> = self.assets.read().values().cloned().collect();
        sort_by_market_cap(&mut all);
        Ok(all)
    }

    async fn get_asset(&self, id: &str) -> PersistResult<Option<AssetSnapshot>> {
        Ok(self.assets.read().get(id).cloned())
    }

    async fn upsert_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<Vec<AssetSnapshot>> {
        let stamped: Vec<AssetSnapshot> = assets.iter().cloned().map(|a| a.stamp(at)).collect();

        let mut map = self.assets.write();
        for snap in &stamped {
            map.insert(snap.id.clone(), snap.clone());
        }
        Ok(stamped)
    }

    async fn get_top_assets(&self) -> PersistResult<Option<AssetListSnapshot>> {
        let assets = self.assets.read();
        let Some(ranking) = self.ranking.read().clone() else {
            return Ok(None);
        };

        let ranked = ranking.ids.iter().filter_map(|id| assets.get(id).cloned()).collect();
        Ok(Some(AssetListSnapshot { assets: ranked, last_updated: ranking.last_updated }))
    }

    async fn replace_top_assets(
        &self,
        assets: &[Asset],
        at: DateTime<Utc>,
    ) -> PersistResult<AssetListSnapshot> {
        let list = stamp_ranking(assets, at);

        let mut map = self.assets.write();
        let mut ranking = self.ranking.write();
        for snap in &list.assets {
            map.insert(snap.id.clone(), snap.clone());
        }
        *ranking = Some(Ranking {
            ids: list.assets.iter().map(|a| a.id.clone()).collect(),
            last_updated: at,
        });
        Ok(list)
    }

    async fn get_market_stats(&self) -> PersistResult<Option<GlobalStatsSnapshot>> {
        Ok(self.market_stats.read().clone())
    }

    async fn upsert_market_stats(
        &self,
        stats: &GlobalStats,
        at: DateTime<Utc>,
    ) -> PersistResult<GlobalStatsSnapshot> {
        let snap = stats.clone().stamp(at);
        *self.market_stats.write() = Some(snap.clone());
        Ok(snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn asset(id: &str, price: f64, market_cap: f64) -> Asset {
        Asset {
            id: id.into(),
            name: id.into(),
            symbol: id.to_uppercase(),
            price,
            price_change_24h: 0.0,
            market_cap,
            volume_24h: 0.0,
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_ids_keep_last_write() {
        let store = MemoryStore::new();
        let at = Utc::now();
        let s1 = asset("bitcoin", 1.0, 10.0);
        let s2 = asset("bitcoin", 2.0, 20.0);

        store.upsert_assets(&[s1, s2.clone()], at).await.unwrap();

        assert_eq!(store.len(), 1);
        let got = store.get_asset("bitcoin").await.unwrap().unwrap();
        assert_eq!(got, s2.stamp(at));
    }

    #[tokio::test]
    async fn newer_upsert_overwrites_older() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.upsert_assets(&[asset("eth", 1.0, 1.0)], t0).await.unwrap();
        store
            .upsert_assets(&[asset("eth", 5.0, 1.0)], t0 + Duration::seconds(30))
            .await
            .unwrap();

        let got = store.get_asset("eth").await.unwrap().unwrap();
        assert_eq!(got.price, 5.0);
        assert_eq!(got.last_updated, t0 + Duration::seconds(30));
    }

    #[tokio::test]
    async fn assets_ordered_by_market_cap() {
        let store = MemoryStore::new();
        store
            .upsert_assets(
                &[asset("c", 1.0, 5.0), asset("a", 1.0, 50.0), asset("b", 1.0, 20.0)],
                Utc::now(),
            )
            .await
            .unwrap();

        let ids: Vec<String> = store.get_assets().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn ranking_is_stamped_separately_from_its_entries() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        assert!(store.get_top_assets().await.unwrap().is_none());

        store.upsert_assets(&[asset("solo", 1.0, 1.0e12)], t0).await.unwrap();
        assert!(store.get_top_assets().await.unwrap().is_none());

        store
            .replace_top_assets(&[asset("btc", 1.0, 50.0), asset("eth", 1.0, 20.0)], t0)
            .await
            .unwrap();
        let t1 = t0 + Duration::minutes(6);
        store.upsert_assets(&[asset("btc", 9.0, 50.0)], t1).await.unwrap();

        let list = store.get_top_assets().await.unwrap().unwrap();
        assert_eq!(list.last_updated, t0);
        let ids: Vec<&str> = list.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["btc", "eth"]);
        assert_eq!(list.assets[0].price, 9.0);
        assert_eq!(list.assets[0].last_updated, t1);
    }

    #[tokio::test]
    async fn replacing_the_ranking_drops_old_members() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store
            .replace_top_assets(&[asset("a", 1.0, 3.0), asset("b", 1.0, 2.0)], t0)
            .await
            .unwrap();
        let written = store
            .replace_top_assets(&[asset("c", 1.0, 9.0), asset("a", 1.0, 3.0), asset("c", 2.0, 9.0)], t0)
            .await
            .unwrap();

        let ids: Vec<&str> = written.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(written.assets[0].price, 2.0);
        assert_eq!(store.get_top_assets().await.unwrap().unwrap(), written);
        // "b" is no longer ranked but its record remains
        assert!(store.get_asset("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn market_stats_singleton() {
        let store = MemoryStore::new();
        assert!(store.get_market_stats().await.unwrap().is_none());

        let stats = GlobalStats {
            total_market_cap: 1.0,
            total_volume: 2.0,
            btc_dominance: 50.0,
            active_cryptos: 10,
        };
        let at = Utc::now();
        store.upsert_market_stats(&stats, at).await.unwrap();
        let replaced = GlobalStats { active_cryptos: 11, ..stats };
        store.upsert_market_stats(&replaced, at).await.unwrap();

        let got = store.get_market_stats().await.unwrap().unwrap();
        assert_eq!(got.active_cryptos, 11);
        assert_eq!(got.last_updated, at);
    }
}
