//! One update run: load → fetch → merge → persist.

use chrono::NaiveDateTime;
use tracing::info;

use ohlc_common::{UpdateError, TIMESTAMP_FORMAT};

use crate::providers::FallbackFetcher;
use crate::reconcile::merge;
use crate::store::CandleStore;

/// Outcome of one successful run, for reporting only.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub total_rows: usize,
    pub new_rows: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

pub struct UpdateFlow {
    store: CandleStore,
    fetcher: FallbackFetcher,
    limit: u32,
}

impl UpdateFlow {
    pub fn new(store: CandleStore, fetcher: FallbackFetcher, limit: u32) -> Self {
        Self {
            store,
            fetcher,
            limit,
        }
    }

    /// Linear, no back-edges. Fails at load (missing or corrupt table,
    /// before any network call) and at fetch (all providers down);
    /// persist failures propagate instead of reporting false success.
    /// Always persists after a successful fetch, even with zero new
    /// rows: recent in-progress candles may have been corrected.
    pub async fn execute(&self) -> Result<UpdateReport, UpdateError> {
        let existing = self.store.load()?;
        info!("✓ Loaded {} existing rows", existing.len());

        let incoming = self.fetcher.fetch_recent(self.limit).await?;

        let merged = merge(&existing, &incoming);
        let new_rows = merged.len() - existing.len();

        self.store.save(&merged)?;

        let report = UpdateReport {
            total_rows: merged.len(),
            new_rows,
            earliest: merged.earliest(),
            latest: merged.latest(),
        };

        if report.new_rows > 0 {
            info!("✓ Candle table updated:");
            info!("  • Total rows: {}", report.total_rows);
            if let (Some(earliest), Some(latest)) = (report.earliest, report.latest) {
                info!(
                    "  • Date range: {} to {}",
                    earliest.format(TIMESTAMP_FORMAT),
                    latest.format(TIMESTAMP_FORMAT)
                );
            }
            info!("  • New rows added: {}", report.new_rows);
        } else {
            info!("✓ Candle table updated (no new rows, but data refreshed)");
            if let Some(latest) = report.latest {
                info!("  • Latest timestamp: {}", latest.format(TIMESTAMP_FORMAT));
            }
        }

        Ok(report)
    }
}
