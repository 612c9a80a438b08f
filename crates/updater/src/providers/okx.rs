//! OKX v5 market candles provider.
//! https://www.okx.com/docs-v5/en/

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use ohlc_common::{civil_time_from_millis, coerce_price, AdapterUnavailable, Candle};

use super::{cell, CandleProvider, REQUEST_TIMEOUT_SECS};

const OKX_CANDLES_URL: &str = "https://www.okx.com/api/v5/market/candles";

#[derive(Debug, Deserialize)]
struct CandlesEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    /// Rows are `[tsMs, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`
    /// as strings, newest first.
    #[serde(default)]
    data: Vec<Vec<String>>,
}

pub struct OkxProvider {
    client: Client,
}

impl OkxProvider {
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
            ("instId", "BTC-USDT".to_string()),
            ("bar", "1H".to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self
            .client
            .get(OKX_CANDLES_URL)
            .query(&params)
            .send()
            .await
            .context("request to OKX failed")?;

        if !response.status().is_success() {
            anyhow::bail!("OKX returned HTTP {}", response.status());
        }

        let envelope: CandlesEnvelope = response
            .json()
            .await
            .context("failed to parse OKX response")?;

        candles_from_envelope(envelope)
    }
}

impl Default for OkxProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn candles_from_envelope(envelope: CandlesEnvelope) -> Result<Vec<Candle>> {
    if envelope.code != "0" {
        anyhow::bail!("OKX error {}: {}", envelope.code, envelope.msg);
    }

    if envelope.data.is_empty() {
        anyhow::bail!("no data returned from OKX");
    }

    let mut candles = Vec::with_capacity(envelope.data.len());
    for row in &envelope.data {
        let timestamp = cell(row, 0)
            .parse::<i64>()
            .ok()
            .and_then(civil_time_from_millis)
            .with_context(|| format!("unparseable OKX candle time {:?}", cell(row, 0)))?;

        // Quote volumes and the confirm flag (indices 6..9) are dropped.
        candles.push(Candle {
            timestamp,
            open: coerce_price(cell(row, 1)),
            high: coerce_price(cell(row, 2)),
            low: coerce_price(cell(row, 3)),
            close: coerce_price(cell(row, 4)),
            volume: coerce_price(cell(row, 5)),
        });
    }

    // OKX delivers newest first.
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

#[async_trait]
impl CandleProvider for OkxProvider {
    fn name(&self) -> &'static str {
        "OKX"
    }

    async fn fetch_candles(&self, limit: u32) -> Result<Vec<Candle>, AdapterUnavailable> {
        self.fetch_once(limit).await.map_err(|e| AdapterUnavailable {
            provider: self.name(),
            reason: format!("{e:#}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> CandlesEnvelope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_rows_and_drops_extra_fields() {
        let envelope = envelope(
            r#"{
                "code": "0",
                "msg": "",
                "data": [
                    ["1704070800000", "42100", "42200", "42000", "42150.5", "120.5", "5071234", "5071234", "1"],
                    ["1704067200000", "42000", "42120", "41900", "42100", "98.2", "4130000", "4130000", "1"]
                ]
            }"#,
        );

        let candles = candles_from_envelope(envelope).unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(
            candles[1].timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-01-01 09:00:00"
        );
        assert_eq!(candles[1].close, 42150.5);
    }

    #[test]
    fn non_zero_code_fails_the_adapter() {
        let envelope = envelope(r#"{"code": "50011", "msg": "rate limit reached", "data": []}"#);
        let err = candles_from_envelope(envelope).unwrap_err();
        assert!(err.to_string().contains("rate limit reached"));
    }

    #[test]
    fn empty_data_fails_the_adapter() {
        let envelope = envelope(r#"{"code": "0", "msg": "", "data": []}"#);
        assert!(candles_from_envelope(envelope).is_err());
    }

    #[test]
    fn short_rows_coerce_missing_cells_to_nan() {
        let envelope = envelope(r#"{"code": "0", "data": [["1704067200000", "42000"]]}"#);
        let candles = candles_from_envelope(envelope).unwrap();
        assert_eq!(candles[0].open, 42000.0);
        assert!(candles[0].volume.is_nan());
    }
}
