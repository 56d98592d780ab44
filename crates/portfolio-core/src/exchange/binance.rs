//! Binance Spot Client
//!
//! Public market-data endpoints only: ticker price and klines.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{ExchangeClient, KLINE_INTERVAL};
use crate::error::{Result, WalletError};
use crate::model::{Candle, Quote};

/// Fields in a Binance kline row: open time, OHLCV, close time, quote volume,
/// trade count, taker base volume, taker quote volume.
const KLINE_MIN_FIELDS: usize = 11;

/// Binance client configuration
#[derive(Clone, Debug)]
pub struct BinanceConfig {
    /// REST base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".into(),
            timeout_secs: 30,
        }
    }
}

/// Build the venue pair for a symbol and a currency.
///
/// Binance quotes dollars through the USDT stablecoin, so `USD` gets a
/// trailing `T`. Symbols are used exactly as typed.
pub fn trading_pair(symbol: &str, currency: &str) -> String {
    let suffix = if currency == "USD" { "T" } else { "" };
    format!("{symbol}{currency}{suffix}")
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default, with = "rust_decimal::serde::str_option")]
    price: Option<Decimal>,

    #[serde(default)]
    code: i64,

    #[serde(default)]
    msg: Option<String>,
}

/// Decode a `/api/v3/ticker/price` body into a quote.
///
/// A nonzero `code` always wins over any price in the payload.
fn decode_ticker(symbol: &str, currency: &str, status: StatusCode, body: &str) -> Result<Quote> {
    let pair = trading_pair(symbol, currency);
    let ticker: TickerResponse = serde_json::from_str(body)?;

    if ticker.code != 0 {
        tracing::debug!(
            pair = %pair,
            code = ticker.code,
            msg = ticker.msg.as_deref().unwrap_or(""),
            "venue rejected pair"
        );
        return Err(WalletError::UnknownPair(pair));
    }

    if !status.is_success() {
        return Err(WalletError::Exchange(format!("{pair}: HTTP {status}")));
    }

    let price = ticker
        .price
        .ok_or_else(|| WalletError::InvalidData(format!("ticker for {pair} has no price")))?;

    Ok(Quote {
        symbol: symbol.to_string(),
        currency: currency.to_string(),
        pair,
        price,
        fetched_at: Utc::now(),
    })
}

/// Parse a `/api/v3/klines` body.
///
/// Every row must be an array of at least `KLINE_MIN_FIELDS` values; a single
/// malformed row fails the whole batch.
pub fn parse_klines(payload: &Value) -> Result<Vec<Candle>> {
    let rows = payload
        .as_array()
        .ok_or_else(|| WalletError::InvalidData("kline payload is not an array".into()))?;

    if rows.is_empty() {
        return Err(WalletError::InvalidData("no candles".into()));
    }

    rows.iter()
        .enumerate()
        .map(|(idx, row)| parse_kline_row(idx, row))
        .collect()
}

fn parse_kline_row(idx: usize, row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .filter(|fields| fields.len() >= KLINE_MIN_FIELDS)
        .ok_or_else(|| WalletError::InvalidData(format!("kline row {idx} is incomplete")))?;

    let open_time = fields[0]
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| WalletError::InvalidData(format!("kline row {idx}: bad open time")))?;

    let number = |pos: usize| -> Result<f64> {
        fields[pos]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| WalletError::InvalidData(format!("kline row {idx}: bad field {pos}")))
    };

    Ok(Candle {
        open_time,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}

/// Binance REST client
pub struct BinanceClient {
    client: Client,
    config: BinanceConfig,
}

impl BinanceClient {
    pub fn new(config: BinanceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WalletError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn get_price(&self, symbol: &str, currency: &str) -> Result<Quote> {
        let pair = trading_pair(symbol, currency);
        let response = self
            .client
            .get(self.url("/api/v3/ticker/price"))
            .query(&[("symbol", pair.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_ticker(symbol, currency, status, &body)
    }

    async fn get_candles(
        &self,
        symbol: &str,
        currency: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let pair = trading_pair(symbol, currency);
        let start_ms = start.timestamp_millis().to_string();
        let response = self
            .client
            .get(self.url("/api/v3/klines"))
            .query(&[
                ("symbol", pair.as_str()),
                ("interval", KLINE_INTERVAL),
                ("startTime", start_ms.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;

        if let Some(code) = payload.get("code").and_then(Value::as_i64) {
            if code != 0 {
                return Err(WalletError::UnknownPair(pair));
            }
        }
        if !status.is_success() {
            return Err(WalletError::Exchange(format!("{pair}: HTTP {status}")));
        }

        parse_klines(&payload)
    }

    fn name(&self) -> &str {
        "Binance"
    }
}
