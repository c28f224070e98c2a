//! Error types for the fallible edges of the view model.
//!
//! The reactive core itself never fails; only payload parsing and
//! configuration validation report errors.

use thiserror::Error;

/// Errors from [`Store`](crate::Store) ingestion
#[derive(Debug, Error)]
pub enum StoreError {
    /// The update payload was not a JSON array of items
    #[error("invalid item payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors from [`ViewConfig`](crate::ViewConfig) loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Pages must hold at least one item
    #[error("page size must be at least 1")]
    ZeroPageSize,
    /// The page-number window must be a finite, non-negative width
    #[error("page slide must be finite and non-negative, got {0}")]
    InvalidPageSlide(f64),
    /// The config document could not be parsed
    #[error("invalid view config: {0}")]
    Parse(#[from] serde_json::Error),
}
