use std::time::Duration;

use thiserror::Error;

/// Failure talking to the upstream catalog.
///
/// Cloneable so one failed refresh can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The request did not complete within the configured timeout.
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
    /// The catalog answered with a non-success HTTP status.
    #[error("catalog responded with HTTP {0}")]
    Status(u16),
    /// Connection-level failure.
    #[error("catalog request failed: {0}")]
    Transport(String),
    /// The response body was not the expected JSON array.
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

/// Errors surfaced by catalog queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// There is nothing to answer with: the snapshot is empty, or upstream failed
    /// and no earlier snapshot exists.
    #[error("no games available")]
    NoData,
    /// The requested id is not in the catalog, even after a forced refresh.
    #[error("game {0} not found")]
    NotFound(String),
}

/// Convenience alias for catalog query results.
pub type CatalogResult<T> = Result<T, CatalogError>;
