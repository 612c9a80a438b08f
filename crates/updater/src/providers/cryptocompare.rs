//! CryptoCompare histohour provider.
//! https://min-api.cryptocompare.com/
//!
//! Unlike the exchange APIs this one reports epoch seconds and JSON
//! numbers, and volume lives in `volumefrom`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use ohlc_common::{civil_time_from_secs, AdapterUnavailable, Candle};

use super::{CandleProvider, REQUEST_TIMEOUT_SECS};

const CRYPTOCOMPARE_URL: &str = "https://min-api.cryptocompare.com/data/v2/histohour";

#[derive(Debug, Deserialize)]
struct HistoHourEnvelope {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: HistoHourData,
}

#[derive(Debug, Default, Deserialize)]
struct HistoHourData {
    #[serde(rename = "Data", default)]
    data: Vec<Value>,
}

pub struct CryptoCompareProvider {
    client: Client,
}

impl CryptoCompareProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("ohlc-updater/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn fetch_once(&self, limit: u32) -> Result<Vec<Candle>> {
        let params = [
            ("fsym", "BTC".to_string()),
            ("tsym", "USDT".to_string()),
            ("limit", limit.to_string()),
            // Binance as the exchange reference
            ("e", "binance".to_string()),
        ];

        let response = self
            .client
            .get(CRYPTOCOMPARE_URL)
            .query(&params)
            .send()
            .await
            .context("request to CryptoCompare failed")?;

        if !response.status().is_success() {
            anyhow::bail!("CryptoCompare returned HTTP {}", response.status());
        }

        let envelope: HistoHourEnvelope = response
            .json()
            .await
            .context("failed to parse CryptoCompare response")?;

        candles_from_envelope(envelope)
    }
}

impl Default for CryptoCompareProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing or non-numeric value fields coerce to NaN.
fn field(row: &Value, key: &str) -> f64 {
    row.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

fn candles_from_envelope(envelope: HistoHourEnvelope) -> Result<Vec<Candle>> {
    if envelope.response != "Success" {
        anyhow::bail!("CryptoCompare error: {}", envelope.message);
    }

    if envelope.data.data.is_empty() {
        anyhow::bail!("no data returned from CryptoCompare");
    }

    let mut candles = Vec::with_capacity(envelope.data.data.len());
    for row in &envelope.data.data {
        let secs = row
            .get("time")
            .and_then(Value::as_i64)
            .context("missing candle time in CryptoCompare row")?;
        let timestamp = civil_time_from_secs(secs)
            .with_context(|| format!("unparseable CryptoCompare candle time {secs}"))?;

        candles.push(Candle {
            timestamp,
            open: field(row, "open"),
            high: field(row, "high"),
            low: field(row, "low"),
            close: field(row, "close"),
            volume: field(row, "volumefrom"),
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

#[async_trait]
impl CandleProvider for CryptoCompareProvider {
    fn name(&self) -> &'static str {
        "CryptoCompare"
    }

    async fn fetch_candles(&self, limit: u32) -> Result<Vec<Candle>, AdapterUnavailable> {
        self.fetch_once(limit).await.map_err(|e| AdapterUnavailable {
            provider: self.name(),
            reason: format!("{e:#}"),
        })
    }
}
