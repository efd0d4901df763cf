//! Cached access to the upstream game catalog.
//!
//! The upstream API is slow and rate limited, so the whole catalog is kept as
//! one in-memory snapshot that is refetched once its time-to-live has passed.

/// Query operations over the cached catalog.
pub mod accessor;
/// Single-flight refresh coordination.
pub mod coordinator;
/// Catalog error types.
pub mod error;
/// Snapshot storage and staleness.
pub mod store;
/// Upstream catalog client.
pub mod upstream;

pub use accessor::{CatalogHit, CatalogPage, GameCatalog};
pub use coordinator::{Freshness, RefreshCoordinator};
pub use error::{CatalogError, CatalogResult, UpstreamError};
pub use store::{CacheSnapshot, CacheStore};
pub use upstream::{CatalogSource, FreeToGameClient};
