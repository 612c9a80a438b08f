//! Upstream candle providers and the fallback chain.
//!
//! Each provider is a leaf implementation of [`CandleProvider`] with
//! no shared base behavior beyond the contract: one bounded GET per
//! call, provider envelope validated, rows normalized to ascending
//! hourly [`Candle`]s at the table's civil time.

pub mod bybit;
pub mod cryptocompare;
pub mod okx;

pub use bybit::BybitProvider;
pub use cryptocompare::CryptoCompareProvider;
pub use okx::OkxProvider;

use async_trait::async_trait;
use tracing::{info, warn};

use ohlc_common::{AdapterUnavailable, Candle, UpdateError};

/// HTTP request timeout applied by every provider, in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Candle provider interface
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Provider name used in log lines.
    fn name(&self) -> &'static str;

    /// Fetch the most recent `limit` hourly candles, ascending by
    /// timestamp. Never retries internally; any failure is reported
    /// as [`AdapterUnavailable`] and resolved by the fallback chain.
    async fn fetch_candles(&self, limit: u32) -> Result<Vec<Candle>, AdapterUnavailable>;
}

/// Tries providers in a fixed priority order and accepts the first
/// non-empty result unconditionally. No merging across providers, no
/// voting: provider choice may vary run to run.
pub struct FallbackFetcher {
    providers: Vec<Box<dyn CandleProvider>>,
}

impl FallbackFetcher {
    pub fn new(providers: Vec<Box<dyn CandleProvider>>) -> Self {
        Self { providers }
    }

    /// Default chain: Bybit → OKX → CryptoCompare. Ordered by absence
    /// of geo-restrictions, not by data quality.
    pub fn with_default_providers() -> Self {
        Self::new(vec![
            Box::new(BybitProvider::new()),
            Box::new(OkxProvider::new()),
            Box::new(CryptoCompareProvider::new()),
        ])
    }

    pub async fn fetch_recent(&self, limit: u32) -> Result<Vec<Candle>, UpdateError> {
        info!("Fetching {} most recent hourly candles...", limit);

        for provider in &self.providers {
            info!("Trying {} API...", provider.name());
            match provider.fetch_candles(limit).await {
                Ok(candles) if !candles.is_empty() => {
                    info!(
                        "✓ Successfully fetched {} rows from {}",
                        candles.len(),
                        provider.name()
                    );
                    return Ok(candles);
                }
                Ok(_) => warn!("⚠ No data returned from {}", provider.name()),
                Err(e) => warn!("⚠ {}", e),
            }
        }

        warn!("❌ All APIs failed");
        Err(UpdateError::AllProvidersFailed)
    }
}

/// Row cell accessor for array-shaped kline payloads; out-of-range
/// indices read as an empty cell and coerce to NaN downstream.
pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
