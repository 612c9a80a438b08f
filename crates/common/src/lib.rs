//! Common types and errors shared across the OHLC updater components

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
