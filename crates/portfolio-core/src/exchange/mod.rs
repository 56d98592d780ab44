//! Exchange Integration
//!
//! Abstractions and implementations for the price/kline venue.

mod binance;
mod mock;

pub use binance::{BinanceClient, BinanceConfig, parse_klines, trading_pair};
pub use mock::MockExchangeClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Candle, Quote};

/// Candle interval requested for charts
pub const KLINE_INTERVAL: &str = "30m";

/// Exchange client trait (Strategy pattern)
///
/// The ledger and the interpreter only talk to the venue through this trait,
/// so pair encoding and wire formats stay inside the implementation.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Get the current price of `symbol` quoted in `currency`
    async fn get_price(&self, symbol: &str, currency: &str) -> Result<Quote>;

    /// Get `KLINE_INTERVAL` candles for the pair, starting at `start`
    async fn get_candles(
        &self,
        symbol: &str,
        currency: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<Candle>>;

    /// Exchange name
    fn name(&self) -> &str;
}
