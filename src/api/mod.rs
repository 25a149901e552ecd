//! HTTP surface: four read-only JSON endpoints over the cache coordinator.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, MethodRouter};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CacheCoordinator;

pub use error::ApiError;

type AppState = Arc<CacheCoordinator>;

/// Any origin may read; preflight is answered by the CORS layer.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(coordinator: Arc<CacheCoordinator>) -> Router {
    Router::new()
        .route("/api/crypto/top25", read_only(get(handlers::top25)))
        .route("/api/crypto/", read_only(get(handlers::missing_id)))
        .route("/api/crypto/:id", read_only(get(handlers::asset)))
        .route("/api/crypto/:id/chart", read_only(get(handlers::chart)))
        .route("/api/market/stats", read_only(get(handlers::market_stats)))
        .route("/health", read_only(get(handlers::health)))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(coordinator)
}

// Any method without a handler gets the JSON 405 instead of an empty body.
fn read_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(handlers::method_not_allowed)
}
