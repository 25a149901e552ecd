// Market data module entrypoint
pub mod adapters;   // upstream fetchers (e.g. CoinGecko)
pub mod chart;      // synthetic price history from a single snapshot
pub mod error;
pub mod normaliser; // wire shapes -> internal records
pub mod types;

pub use error::MarketDataError;
pub use types::*;
