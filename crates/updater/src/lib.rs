//! Hourly BTC/USDT candle updater: polls upstream providers with
//! failover, merges the result into a persisted CSV table keep-last,
//! and rewrites the table atomically.

pub mod providers;
pub mod reconcile;
pub mod store;
pub mod update;
