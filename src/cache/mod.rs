// Read-through caching between the API and the upstream provider
pub mod coordinator; // per-entity cache-or-fetch orchestration
pub mod error;
pub mod freshness;   // TTL policy over a SnapshotStore

pub use coordinator::CacheCoordinator;
pub use error::CoordinatorError;
pub use freshness::{is_valid, Cached, FreshnessCache, DEFAULT_TTL};
