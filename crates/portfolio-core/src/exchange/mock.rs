//! Mock Exchange Client
//!
//! For testing and demo purposes. Returns static prices and synthetic candles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde_json::Value;

use super::{ExchangeClient, parse_klines, trading_pair};
use crate::error::{Result, WalletError};
use crate::model::{Candle, Quote};

/// Mock exchange client with static prices
pub struct MockExchangeClient {
    prices: HashMap<String, Decimal>,

    /// Raw kline body returned for every pair instead of synthetic candles
    kline_payload: Option<Value>,

    /// Number of price lookups served, failed ones included
    price_requests: AtomicUsize,
}

impl Default for MockExchangeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchangeClient {
    pub fn new() -> Self {
        // RUB prices per unit
        let prices = [
            ("BTC", dec!(6_500_000)),
            ("ETH", dec!(240_000)),
            ("SOL", dec!(13_500)),
            ("XRP", dec!(160)),
            ("DOGE", dec!(25)),
            ("LTC", dec!(7_300)),
        ]
        .into_iter()
        .map(|(symbol, price)| (symbol.to_string(), price))
        .collect();

        Self {
            prices,
            kline_payload: None,
            price_requests: AtomicUsize::new(0),
        }
    }

    /// Mock with no listed symbols; every lookup fails
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
            ..Self::new()
        }
    }

    /// Set or override the price of a symbol
    #[must_use]
    pub fn with_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(symbol.into(), price);
        self
    }

    /// Serve this raw kline body, parsed the same way as the real venue's
    #[must_use]
    pub fn with_kline_payload(mut self, payload: Value) -> Self {
        self.kline_payload = Some(payload);
        self
    }

    pub fn price_requests(&self) -> usize {
        self.price_requests.load(Ordering::Relaxed)
    }

    fn synthetic_candles(price: Decimal, start: DateTime<Utc>) -> Vec<Candle> {
        let base = price.to_f64().unwrap_or(1.0);
        (0..48)
            .map(|i| {
                let step = f64::from(i);
                let drift = (step / 6.0).sin() * base * 0.01;
                let open = base + drift;
                let close = base + ((step + 1.0) / 6.0).sin() * base * 0.01;
                Candle {
                    open_time: start + Duration::minutes(30 * i64::from(i)),
                    open,
                    high: open.max(close) * 1.002,
                    low: open.min(close) * 0.998,
                    close,
                    volume: 10.0 + step,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ExchangeClient for MockExchangeClient {
    async fn get_price(&self, symbol: &str, currency: &str) -> Result<Quote> {
        self.price_requests.fetch_add(1, Ordering::Relaxed);
        let pair = trading_pair(symbol, currency);
        let price = *self
            .prices
            .get(symbol)
            .ok_or_else(|| WalletError::UnknownPair(pair.clone()))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            pair,
            price,
            fetched_at: Utc::now(),
        })
    }

    async fn get_candles(
        &self,
        symbol: &str,
        currency: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        if let Some(payload) = &self.kline_payload {
            return parse_klines(payload);
        }

        let price = self
            .prices
            .get(symbol)
            .ok_or_else(|| WalletError::UnknownPair(trading_pair(symbol, currency)))?;
        Ok(Self::synthetic_candles(*price, start))
    }

    fn name(&self) -> &str {
        "MockExchange"
    }
}
