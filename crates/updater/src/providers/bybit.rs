//! Bybit v5 spot kline provider.
//! https://bybit-exchange.github.io/docs/v5/market/kline

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use ohlc_common::{civil_time_from_millis, coerce_price, AdapterUnavailable, Candle};

use super::{cell, CandleProvider, REQUEST_TIMEOUT_SECS};

const BYBIT_KLINE_URL: &str = "https://api.bybit.com/v5/market/kline";

#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: KlineResult,
}

#[derive(Debug, Default, Deserialize)]
struct KlineResult {
    /// Rows are `[startTimeMs, open, high, low, close, volume, turnover]`
    /// as strings, newest first.
    #[serde(default)]
    list: Vec<Vec<String>>,
}

pub struct BybitProvider {
    client: Client,
}

impl BybitProvider {
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
            ("category", "spot".to_string()),
            ("symbol", "BTCUSDT".to_string()),
            ("interval", "60".to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self
            .client
            .get(BYBIT_KLINE_URL)
            .query(&params)
            .send()
            .await
            .context("request to Bybit failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Bybit returned HTTP {}", response.status());
        }

        let envelope: KlineEnvelope = response
            .json()
            .await
            .context("failed to parse Bybit response")?;

        candles_from_envelope(envelope)
    }
}

impl Default for BybitProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn candles_from_envelope(envelope: KlineEnvelope) -> Result<Vec<Candle>> {
    if envelope.ret_code != 0 {
        anyhow::bail!("Bybit error {}: {}", envelope.ret_code, envelope.ret_msg);
    }

    if envelope.result.list.is_empty() {
        anyhow::bail!("no data returned from Bybit");
    }

    let mut candles = Vec::with_capacity(envelope.result.list.len());
    for row in &envelope.result.list {
        let timestamp = cell(row, 0)
            .parse::<i64>()
            .ok()
            .and_then(civil_time_from_millis)
            .with_context(|| format!("unparseable Bybit start time {:?}", cell(row, 0)))?;

        // Turnover (index 6) is dropped.
        candles.push(Candle {
            timestamp,
            open: coerce_price(cell(row, 1)),
            high: coerce_price(cell(row, 2)),
            low: coerce_price(cell(row, 3)),
            close: coerce_price(cell(row, 4)),
            volume: coerce_price(cell(row, 5)),
        });
    }

    // Bybit delivers newest first.
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

#[async_trait]
impl CandleProvider for BybitProvider {
    fn name(&self) -> &'static str {
        "Bybit"
    }

    async fn fetch_candles(&self, limit: u32) -> Result<Vec<Candle>, AdapterUnavailable> {
        self.fetch_once(limit).await.map_err(|e| AdapterUnavailable {
            provider: self.name(),
            reason: format!("{e:#}"),
        })
    }
}
