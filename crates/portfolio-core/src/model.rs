//! Domain Models
//!
//! Core data types for the per-chat wallet tracker.
//! Holdings and prices use `rust_decimal`; candles stay `f64` because they
//! only feed the chart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Chat identifier scoping one wallet
pub type SessionId = i64;

/// A chat's holdings: symbol -> quantity
pub type Wallet = HashMap<String, Decimal>;

/// Upper bound for a command amount and for any single balance
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// One held symbol, copied out of the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: Decimal,
}

/// A spot price for a trading pair
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Asset ticker as the user typed it (e.g., "BTC")
    pub symbol: String,

    /// Fiat/quote currency (e.g., "RUB")
    pub currency: String,

    /// Venue-specific pair identifier (e.g., "BTCRUB")
    pub pair: String,

    pub price: Decimal,

    pub fetched_at: DateTime<Utc>,
}

/// OHLCV candle used for charting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A single row of a valuation report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValuationLine {
    pub symbol: String,
    pub quantity: Decimal,

    /// Unit price, `None` when the lookup failed
    pub price: Option<Decimal>,

    /// quantity * price, zero when the lookup failed
    pub value: Decimal,

    /// Reason the price is missing
    pub error: Option<String>,
}

impl ValuationLine {
    /// Line valued at `price`; falls back to an unpriced line if the value overflows
    pub fn priced(symbol: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        match quantity.checked_mul(price) {
            Some(value) => Self {
                symbol: symbol.into(),
                quantity,
                price: Some(price),
                value,
                error: None,
            },
            None => Self::unpriced(symbol, quantity, "value out of range"),
        }
    }

    pub fn unpriced(symbol: impl Into<String>, quantity: Decimal, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            price: None,
            value: Decimal::ZERO,
            error: Some(error.into()),
        }
    }

    pub const fn is_priced(&self) -> bool {
        self.price.is_some()
    }
}

/// Live valuation of a wallet in one currency
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Valuation {
    pub currency: String,
    pub lines: Vec<ValuationLine>,
    pub total: Decimal,
}

impl Valuation {
    /// Sum the lines. A line that would overflow the total is reported unpriced.
    pub fn new(currency: impl Into<String>, mut lines: Vec<ValuationLine>) -> Self {
        let mut total = Decimal::ZERO;
        for line in &mut lines {
            match total.checked_add(line.value) {
                Some(sum) => total = sum,
                None => {
                    let symbol = std::mem::take(&mut line.symbol);
                    *line = ValuationLine::unpriced(symbol, line.quantity, "total out of range");
                }
            }
        }

        Self {
            currency: currency.into(),
            lines,
            total,
        }
    }

    /// Symbols whose price could not be fetched
    pub fn failed_symbols(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| !l.is_priced())
            .map(|l| l.symbol.as_str())
            .collect()
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            if line.is_priced() {
                writeln!(
                    f,
                    "{}: {:.4} [{:.2} {}]",
                    line.symbol, line.quantity, line.value, self.currency
                )?;
            } else {
                writeln!(f, "{}: {:.4} [price unavailable]", line.symbol, line.quantity)?;
            }
        }
        write!(f, "Total: {:.2} {}", self.total, self.currency)
    }
}

/// Outcome of a successful withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Withdrawal {
    /// Balance left after the withdrawal
    Remaining(Decimal),

    /// Whole position withdrawn, entry deleted
    Removed,
}

/// Answer produced for one inbound chat message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Photo {
        /// File name shown by the chat client
        name: String,
        caption: Option<String>,
        bytes: Vec<u8>,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Text body, if this is a text reply
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Photo { .. } => None,
        }
    }
}
