//! Keep-last merge of freshly fetched candles into the stored table.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use ohlc_common::{Candle, CandleTable};

/// Merges `incoming` into `existing` and returns the complete new
/// table: concatenate existing-then-incoming, deduplicate by timestamp
/// keep-last (so a freshly fetched row always overrides the stored row
/// for the same hour), sort ascending.
///
/// Empty `incoming` is a no-op; the fetcher fails the run before that
/// case normally arises.
pub fn merge(existing: &CandleTable, incoming: &[Candle]) -> CandleTable {
    if incoming.is_empty() {
        return existing.clone();
    }

    let mut by_timestamp: BTreeMap<NaiveDateTime, Candle> = BTreeMap::new();
    for candle in existing.rows().iter().chain(incoming) {
        by_timestamp.insert(candle.timestamp, candle.clone());
    }

    CandleTable::from_rows(by_timestamp.into_values().collect())
}
