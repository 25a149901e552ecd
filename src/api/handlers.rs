use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use crate::cache::CacheCoordinator;

// Hints for intermediary caches, matched to how often the dashboard polls.
pub const LIST_CACHE_CONTROL: &str = "s-maxage=300, stale-while-revalidate=600";
pub const ASSET_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=300";
pub const CHART_CACHE_CONTROL: &str = "s-maxage=30, stale-while-revalidate=60";

const TOP_FAILED: &str = "Failed to fetch cryptocurrency data";
const ASSET_FAILED: &str = "Failed to fetch cryptocurrency details";
const CHART_FAILED: &str = "Failed to fetch chart data";
const STATS_FAILED: &str = "Failed to fetch market statistics";

type AppState = State<Arc<CacheCoordinator>>;

fn cached_json<T: serde::Serialize>(cache_control: &'static str, body: T) -> Response {
    ([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response()
}

pub async fn top25(State(coordinator): AppState) -> Result<Response, ApiError> {
    let assets = coordinator
        .top_assets()
        .await
        .map_err(|e| ApiError::from_coordinator(e, TOP_FAILED))?;
    Ok(cached_json(LIST_CACHE_CONTROL, assets))
}

pub async fn asset(
    State(coordinator): AppState,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let asset = coordinator
        .asset(&id)
        .await
        .map_err(|e| ApiError::from_coordinator(e, ASSET_FAILED))?;
    Ok(cached_json(ASSET_CACHE_CONTROL, asset))
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<String>,
}

/// `days` defaults to 1 and must be a positive integer.
pub fn parse_days(raw: Option<&str>) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(1);
    };
    match raw.trim().parse::<u32>() {
        Ok(days) if days >= 1 => Ok(days),
        _ => Err(ApiError::bad_request("Invalid days parameter")),
    }
}

pub async fn chart(
    State(coordinator): AppState,
    Path(id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, ApiError> {
    let days = parse_days(query.days.as_deref())?;
    let points = coordinator
        .chart(&id, days)
        .await
        .map_err(|e| ApiError::from_coordinator(e, CHART_FAILED))?;
    Ok(cached_json(CHART_CACHE_CONTROL, points))
}

pub async fn market_stats(State(coordinator): AppState) -> Result<Response, ApiError> {
    let stats = coordinator
        .market_stats()
        .await
        .map_err(|e| ApiError::from_coordinator(e, STATS_FAILED))?;
    Ok(cached_json(LIST_CACHE_CONTROL, stats))
}

pub async fn missing_id() -> ApiError {
    ApiError::bad_request("Crypto ID is required")
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn not_found() -> ApiError {
    ApiError::new(axum::http::StatusCode::NOT_FOUND, "Not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(axum::http::StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
