use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized market state for one asset, as produced by an adapter.
/// Carries no timestamp; the store stamps it on ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub price_change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub image: String,
}

impl Asset {
    pub fn stamp(self, at: DateTime<Utc>) -> AssetSnapshot {
        AssetSnapshot {
            id: self.id,
            name: self.name,
            symbol: self.symbol,
            price: self.price,
            price_change_24h: self.price_change_24h,
            market_cap: self.market_cap,
            volume_24h: self.volume_24h,
            image: self.image,
            last_updated: at,
        }
    }
}

/// Last known market state of one asset, stamped with ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub price_change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub image: String,
    pub last_updated: DateTime<Utc>,
}

impl AssetSnapshot {
    pub fn asset(&self) -> Asset {
        Asset {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            price: self.price,
            price_change_24h: self.price_change_24h,
            market_cap: self.market_cap,
            volume_24h: self.volume_24h,
            image: self.image.clone(),
        }
    }
}

/// Aggregate market state, unstamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub btc_dominance: f64,
    pub active_cryptos: u64,
}

impl GlobalStats {
    pub fn stamp(self, at: DateTime<Utc>) -> GlobalStatsSnapshot {
        GlobalStatsSnapshot {
            total_market_cap: self.total_market_cap,
            total_volume: self.total_volume,
            btc_dominance: self.btc_dominance,
            active_cryptos: self.active_cryptos,
            last_updated: at,
        }
    }
}

/// Singleton aggregate market record, stamped with ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatsSnapshot {
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub btc_dominance: f64,
    pub active_cryptos: u64,
    pub last_updated: DateTime<Utc>,
}

/// The ranked top-asset list, stamped once for the whole list when it was
/// fetched. Entries carry their own, possibly newer, stamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetListSnapshot {
    pub assets: Vec<AssetSnapshot>,
    pub last_updated: DateTime<Utc>,
}

/// One sample of a price series. `timestamp` is ms since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_camel_case() {
        let snap = Asset {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            price: 50_000.0,
            price_change_24h: 1.5,
            market_cap: 1.0e12,
            volume_24h: 3.0e10,
            image: "https://example.com/btc.png".into(),
        }
        .stamp(Utc::now());

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["priceChange24h"], 1.5);
        assert_eq!(json["volume24h"], 3.0e10);
        assert_eq!(json["marketCap"], 1.0e12);
        assert!(json["lastUpdated"].is_string());
    }
}
