use thiserror::Error;

use crate::market_data::MarketDataError;
use crate::persist::PersistError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Upstream failure, passed through unmodified.
    #[error(transparent)]
    Upstream(#[from] MarketDataError),

    /// No snapshot exists (or can be obtained) to seed a chart.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// Rejected before touching the cache or upstream.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("snapshot store failure: {0}")]
    Store(#[from] PersistError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
