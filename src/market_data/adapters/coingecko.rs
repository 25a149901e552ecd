// CoinGecko REST adapter: builds the three upstream requests and hands the
// decoded bodies to the normaliser.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::coingecko_types::{CoinDetail, GlobalResponse, MarketCoin};
use super::MarketDataSource;
use crate::config::UpstreamSettings;
use crate::market_data::error::MarketDataError;
use crate::market_data::normaliser;
use crate::market_data::types::{Asset, GlobalStats};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const USER_AGENT: &str = concat!("coinboard-rs/", env!("CARGO_PKG_VERSION"));

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: Url, // e.g. "https://api.coingecko.com/api/v3"
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MarketDataError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MarketDataError::Setup(format!("invalid base url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MarketDataError::Setup(format!("base url {base_url} cannot hold a path")));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::Setup(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, MarketDataError> {
        Self::new(&settings.base_url, Duration::from_millis(settings.timeout_ms))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // Append path segments to the base url; ids are percent-encoded by Url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // Single GET, status check, then decode. Body is read fully before
    // decoding so transport errors and shape errors stay distinguishable.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        endpoint: &'static str,
        entity: &str,
    ) -> Result<T, MarketDataError> {
        debug!(endpoint, entity, url = %url, "Requesting upstream");

        let res = self.http.get(url).send().await.map_err(|e| {
            warn!(endpoint, entity, error = %e, timeout = e.is_timeout(), "Upstream request failed");
            record_request(endpoint, "unavailable");
            MarketDataError::unavailable(e.status().map(|s| s.as_u16()), e.to_string())
        })?;

        let status = res.status();
        if !status.is_success() {
            warn!(endpoint, entity, status = status.as_u16(), "Upstream returned error status");
            record_request(endpoint, "unavailable");
            return Err(MarketDataError::unavailable(
                Some(status.as_u16()),
                format!("upstream returned {status}"),
            ));
        }

        let body = res.bytes().await.map_err(|e| {
            warn!(endpoint, entity, error = %e, "Failed reading upstream body");
            record_request(endpoint, "unavailable");
            MarketDataError::unavailable(Some(status.as_u16()), e.to_string())
        })?;

        let decoded = serde_json::from_slice::<T>(&body).map_err(|e| {
            warn!(endpoint, entity, error = %e, "Upstream body did not match expected shape");
            record_request(endpoint, "malformed");
            MarketDataError::malformed(entity, e.to_string())
        })?;

        record_request(endpoint, "ok");
        Ok(decoded)
    }
}

fn record_request(endpoint: &'static str, result: &'static str) {
    metrics::counter!(
        "coinboard_upstream_requests_total",
        "endpoint" => endpoint,
        "result" => result
    )
    .increment(1);
}

#[async_trait::async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, MarketDataError> {
        let mut url = self.endpoint(&["coins", "markets"]);
        url.query_pairs_mut()
            .append_pair("vs_currency", "usd")
            .append_pair("order", "market_cap_desc")
            .append_pair("per_page", &limit.to_string())
            .append_pair("page", "1")
            .append_pair("sparkline", "false")
            .append_pair("price_change_percentage", "24h");

        let coins: Vec<MarketCoin> = self.get_json(url, "coins_markets", "top_assets").await?;
        coins.into_iter().map(normaliser::asset_from_market_coin).collect()
    }

    async fn fetch_asset_by_id(&self, id: &str) -> Result<Asset, MarketDataError> {
        let url = self.endpoint(&["coins", id]);
        let entity = format!("asset:{id}");
        let detail: CoinDetail = self.get_json(url, "coins_by_id", &entity).await?;
        normaliser::asset_from_detail(detail)
    }

    async fn fetch_global_stats(&self) -> Result<GlobalStats, MarketDataError> {
        let url = self.endpoint(&["global"]);
        let resp: GlobalResponse = self.get_json(url, "global", "global_stats").await?;
        normaliser::global_stats_from_response(resp)
    }
}
