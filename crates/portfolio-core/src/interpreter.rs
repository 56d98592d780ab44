//! Command Interpreter
//!
//! Maps one inbound chat line to ledger, price or chart work and builds the reply.
//! Every failure ends up as a reply; nothing here returns an error to the transport.

use std::sync::Arc;

use crate::chart::candle_chart;
use crate::command::Command;
use crate::error::WalletError;
use crate::exchange::ExchangeClient;
use crate::ledger::Ledger;
use crate::model::{Reply, SessionId, Withdrawal};

/// Currency used for valuations and charts unless configured otherwise
pub const DEFAULT_CURRENCY: &str = "RUB";

/// File name of the chart photo
pub const CHART_FILE_NAME: &str = "candles Graph";

pub const UNKNOWN_COMMAND_REPLY: &str = "No such command!";
pub const CHART_FAILURE_REPLY: &str = "Error when trying to send candles Graph";

/// Stateless dispatcher over a shared ledger and exchange
#[derive(Clone)]
pub struct Interpreter {
    ledger: Arc<Ledger>,
    exchange: Arc<dyn ExchangeClient>,
    currency: String,
}

impl Interpreter {
    pub fn new(ledger: Arc<Ledger>, exchange: Arc<dyn ExchangeClient>) -> Self {
        Self {
            ledger,
            exchange,
            currency: DEFAULT_CURRENCY.into(),
        }
    }

    /// Quote valuations and charts in `currency` instead of the default
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Handle one message from `session`
    pub async fn handle(&self, session: SessionId, text: &str) -> Reply {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(session, text, "rejected command: {}", e);
                return Reply::Text(malformed_reply(&e, text));
            }
        };

        tracing::debug!(session, verb = command.verb(), "handling command");

        match command {
            Command::Deposit { symbol, amount } => {
                match self.ledger.deposit(session, &symbol, amount) {
                    Ok(balance) => Reply::Text(format!(
                        "Currency added! {symbol}: balance is: {balance:.4}"
                    )),
                    Err(e) => Reply::Text(e.user_message()),
                }
            }
            Command::Withdraw { symbol, amount } => {
                match self.ledger.withdraw(session, &symbol, amount) {
                    Ok(Withdrawal::Remaining(balance)) => Reply::Text(format!(
                        "Change fixed: {symbol}: balance is: {balance:.4}"
                    )),
                    Ok(Withdrawal::Removed) => Reply::Text(format!("Deleted: {symbol}")),
                    Err(e) => Reply::Text(e.user_message()),
                }
            }
            Command::Remove { symbol } => {
                self.ledger.remove(session, &symbol);
                Reply::Text(format!("Deleted: {symbol}"))
            }
            Command::Valuation => {
                let valuation = self
                    .ledger
                    .valuation(session, &self.currency, self.exchange.as_ref())
                    .await;
                Reply::Text(valuation.to_string())
            }
            Command::Chart { symbol } => self.chart(session, &symbol).await,
            Command::Unrecognized(_) => Reply::text(UNKNOWN_COMMAND_REPLY),
        }
    }

    async fn chart(&self, session: SessionId, symbol: &str) -> Reply {
        match candle_chart(self.exchange.as_ref(), symbol, &self.currency).await {
            Ok(bytes) => Reply::Photo {
                name: CHART_FILE_NAME.into(),
                caption: Some(format!("{symbol}/{}, last 24h", self.currency)),
                bytes,
            },
            Err(e) if e.is_upstream() => {
                tracing::warn!(session, symbol, exchange = self.exchange.name(), "chart data unavailable: {}", e);
                Reply::text(CHART_FAILURE_REPLY)
            }
            Err(e) => {
                tracing::error!(session, symbol, "chart rendering failed: {}", e);
                Reply::text(CHART_FAILURE_REPLY)
            }
        }
    }
}

/// Reply for a line that did not parse
fn malformed_reply(err: &WalletError, text: &str) -> String {
    match err {
        WalletError::InvalidAmount(raw) => format!("Incorrect command format: {raw}"),
        _ => format!("Incorrect command: {}", text.trim()),
    }
}
