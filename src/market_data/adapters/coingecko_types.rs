// Response shapes for the CoinGecko v3 REST API. Only the fields we read are
// declared; serde ignores the rest.
use serde::Deserialize;

// GET /coins/markets
#[derive(Debug, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: f64,
    pub total_volume: f64,
    pub image: String,
}

// GET /coins/{id}
#[derive(Debug, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: CoinImage,
    pub market_data: CoinMarketData,
}

#[derive(Debug, Deserialize)]
pub struct CoinImage {
    pub large: String,
}

#[derive(Debug, Deserialize)]
pub struct CoinMarketData {
    pub current_price: UsdValue,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: UsdValue,
    pub total_volume: UsdValue,
}

// Currency-keyed objects ({"usd": 1.0, "eur": 0.9, ...}); we only quote USD.
#[derive(Debug, Deserialize)]
pub struct UsdValue {
    pub usd: f64,
}

// GET /global
#[derive(Debug, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Deserialize)]
pub struct GlobalData {
    pub total_market_cap: UsdValue,
    pub total_volume: UsdValue,
    pub market_cap_percentage: MarketCapShare,
    pub active_cryptocurrencies: u64,
}

#[derive(Debug, Deserialize)]
pub struct MarketCapShare {
    pub btc: f64,
}
