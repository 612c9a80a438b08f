//! Error taxonomy for one update run.
//!
//! Adapter failures are non-fatal and absorbed by the fallback chain;
//! everything else surfaces to the run outcome.

use std::path::PathBuf;

use thiserror::Error;

/// A single provider could not deliver usable candles: network error,
/// timeout, non-success envelope code, or empty payload. Triggers
/// fallback to the next provider, never aborts the run by itself.
#[derive(Debug, Error)]
#[error("{provider} unavailable: {reason}")]
pub struct AdapterUnavailable {
    pub provider: &'static str,
    pub reason: String,
}

/// Failures of the persisted candle table.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No table exists yet. The updater only appends to a pre-seeded
    /// history and never bootstraps from nothing.
    #[error("candle table not found: {0}")]
    NotFound(PathBuf),

    /// A table exists but is unreadable or violates the invariant.
    #[error("candle table corrupt: {0}")]
    Corrupt(String),

    /// Persisting the merged table failed. Distinct from a quiet
    /// zero-new-rows run so operators can tell data loss from a no-op.
    #[error("failed to persist candle table: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal outcome of one update run.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Every provider in the fallback chain failed or returned empty.
    #[error("all providers failed")]
    AllProvidersFailed,

    #[error(transparent)]
    Store(#[from] StoreError),
}
