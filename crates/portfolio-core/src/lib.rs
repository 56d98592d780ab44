//! # portfolio-core
//!
//! Per-chat crypto wallet tracking: an in-memory ledger of holdings, live
//! valuation against a fiat currency and recent-price candlestick charts.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   text    ┌─────────────┐   ADD/SUB/DEL   ┌──────────┐
//! │ Transport│ ────────▶ │ Interpreter │ ──────────────▶ │  Ledger  │
//! │ (bot)    │ ◀──────── │  (Command)  │ ──── SHOW ────▶ │          │
//! └──────────┘   Reply   └─────────────┘                 └────┬─────┘
//!                              │ GRAPH                        │ prices
//!                              ▼                              ▼
//!                        ┌──────────┐  klines   ┌──────────────────────┐
//!                        │  chart   │ ────────▶ │ ExchangeClient       │
//!                        │ (PNG)    │           │ (Binance / Mock)     │
//!                        └──────────┘           └──────────────────────┘
//! ```
//!
//! ## Commands
//!
//! | Line               | Effect                                  |
//! |--------------------|-----------------------------------------|
//! | `ADD BTC 1.5`      | deposit 1.5 BTC                         |
//! | `SUB BTC 0.5`      | withdraw 0.5 BTC (never below zero)     |
//! | `DEL BTC`          | drop the BTC position                   |
//! | `SHOW`             | value every position in the currency    |
//! | `GRAPH BTC`        | 24h of 30-minute candles as a PNG       |

pub mod chart;
pub mod command;
pub mod error;
pub mod exchange;
pub mod interpreter;
pub mod ledger;
pub mod model;

pub use command::Command;
pub use error::{Result, WalletError};
pub use interpreter::{DEFAULT_CURRENCY, Interpreter};
pub use ledger::Ledger;
pub use model::{
    Candle, Holding, MAX_AMOUNT, Quote, Reply, SessionId, Valuation, ValuationLine, Wallet, Withdrawal,
};
