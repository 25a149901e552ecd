// Convert provider wire shapes into internal records.
// Symbols are uppercased, a missing 24h change becomes 0, and numbers that
// cannot describe a real market (non-finite, negative, zero price) are rejected.

use crate::market_data::adapters::coingecko_types::{CoinDetail, GlobalResponse, MarketCoin};
use crate::market_data::error::MarketDataError;
use crate::market_data::types::{Asset, GlobalStats};

pub fn asset_from_market_coin(coin: MarketCoin) -> Result<Asset, MarketDataError> {
    let asset = Asset {
        symbol: coin.symbol.to_uppercase(),
        price: coin.current_price,
        price_change_24h: coin.price_change_percentage_24h.unwrap_or(0.0),
        market_cap: coin.market_cap,
        volume_24h: coin.total_volume,
        image: coin.image,
        name: coin.name,
        id: coin.id,
    };
    check_asset(asset)
}

pub fn asset_from_detail(detail: CoinDetail) -> Result<Asset, MarketDataError> {
    let market = detail.market_data;
    let asset = Asset {
        symbol: detail.symbol.to_uppercase(),
        price: market.current_price.usd,
        price_change_24h: market.price_change_percentage_24h.unwrap_or(0.0),
        market_cap: market.market_cap.usd,
        volume_24h: market.total_volume.usd,
        image: detail.image.large,
        name: detail.name,
        id: detail.id,
    };
    check_asset(asset)
}

pub fn global_stats_from_response(resp: GlobalResponse) -> Result<GlobalStats, MarketDataError> {
    let data = resp.data;
    let stats = GlobalStats {
        total_market_cap: data.total_market_cap.usd,
        total_volume: data.total_volume.usd,
        btc_dominance: data.market_cap_percentage.btc,
        active_cryptos: data.active_cryptocurrencies,
    };

    if !is_non_negative(stats.total_market_cap) || !is_non_negative(stats.total_volume) {
        return Err(MarketDataError::malformed(
            "global_stats",
            "negative or non-finite market totals",
        ));
    }
    if !stats.btc_dominance.is_finite() {
        return Err(MarketDataError::malformed("global_stats", "non-finite btc dominance"));
    }
    Ok(stats)
}

fn check_asset(asset: Asset) -> Result<Asset, MarketDataError> {
    let entity = format!("asset:{}", asset.id);
    if asset.id.is_empty() {
        return Err(MarketDataError::malformed(entity, "empty id"));
    }
    if !(asset.price.is_finite() && asset.price > 0.0) {
        return Err(MarketDataError::malformed(entity, format!("invalid price {}", asset.price)));
    }
    // A drop of 100% or more leaves no positive price to walk back from.
    if !(asset.price_change_24h.is_finite() && asset.price_change_24h > -100.0) {
        return Err(MarketDataError::malformed(
            entity,
            format!("invalid 24h change {}", asset.price_change_24h),
        ));
    }
    if !is_non_negative(asset.market_cap) || !is_non_negative(asset.volume_24h) {
        return Err(MarketDataError::malformed(entity, "negative or non-finite market cap/volume"));
    }
    Ok(asset)
}

fn is_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}
