//! Wallet Ledger
//!
//! Process-wide, in-memory mapping from chat session to wallet. The map never
//! leaves this module; callers go through deposit/withdraw/remove/valuation.
//! The lock is held only for map access, never across a network call.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use rust_decimal::Decimal;

use crate::error::{Result, WalletError};
use crate::exchange::ExchangeClient;
use crate::model::{Holding, MAX_AMOUNT, SessionId, Valuation, ValuationLine, Wallet, Withdrawal};

/// In-memory ledger of per-session wallets
#[derive(Debug, Default)]
pub struct Ledger {
    wallets: RwLock<HashMap<SessionId, Wallet>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Wallet>> {
        self.wallets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Wallet>> {
        self.wallets.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_positive(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(amount.to_string()));
        }
        Ok(())
    }

    /// Add `amount` to the session's position in `symbol` and return the new balance.
    ///
    /// A deposit that would take the balance past [`MAX_AMOUNT`] fails and leaves
    /// the wallet untouched.
    pub fn deposit(&self, session: SessionId, symbol: &str, amount: Decimal) -> Result<Decimal> {
        Self::ensure_positive(amount)?;

        let mut wallets = self.write();
        let current = wallets
            .get(&session)
            .and_then(|wallet| wallet.get(symbol))
            .copied()
            .unwrap_or(Decimal::ZERO);
        let balance = current
            .checked_add(amount)
            .filter(|balance| *balance <= MAX_AMOUNT)
            .ok_or_else(|| WalletError::InvalidAmount(amount.to_string()))?;

        wallets
            .entry(session)
            .or_default()
            .insert(symbol.to_string(), balance);

        tracing::debug!(session, symbol, %amount, %balance, "deposit");
        Ok(balance)
    }

    /// Take `amount` out of the session's position in `symbol`.
    ///
    /// Withdrawing the exact balance deletes the entry. Withdrawing more than
    /// the balance fails and leaves the wallet untouched.
    pub fn withdraw(&self, session: SessionId, symbol: &str, amount: Decimal) -> Result<Withdrawal> {
        Self::ensure_positive(amount)?;

        let mut wallets = self.write();
        let wallet = wallets
            .get_mut(&session)
            .ok_or_else(|| WalletError::SymbolNotFound(symbol.to_string()))?;
        let current = *wallet
            .get(symbol)
            .ok_or_else(|| WalletError::SymbolNotFound(symbol.to_string()))?;

        let outcome = match current.cmp(&amount) {
            std::cmp::Ordering::Greater => {
                let remaining = current - amount;
                wallet.insert(symbol.to_string(), remaining);
                Withdrawal::Remaining(remaining)
            }
            std::cmp::Ordering::Equal => {
                wallet.remove(symbol);
                Withdrawal::Removed
            }
            std::cmp::Ordering::Less => {
                return Err(WalletError::InsufficientBalance {
                    symbol: symbol.to_string(),
                    available: current,
                    requested: amount,
                });
            }
        };

        tracing::debug!(session, symbol, %amount, ?outcome, "withdraw");
        Ok(outcome)
    }

    /// Delete the session's entry for `symbol`. Returns whether anything was held.
    pub fn remove(&self, session: SessionId, symbol: &str) -> bool {
        let removed = self
            .write()
            .get_mut(&session)
            .and_then(|wallet| wallet.remove(symbol))
            .is_some();

        tracing::debug!(session, symbol, removed, "remove");
        removed
    }

    /// Current quantity of `symbol`, if held
    #[cfg(test)]
    pub fn balance(&self, session: SessionId, symbol: &str) -> Option<Decimal> {
        self.read()
            .get(&session)
            .and_then(|wallet| wallet.get(symbol))
            .copied()
    }

    /// Snapshot of the session's holdings, ordered by symbol
    pub fn holdings(&self, session: SessionId) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self
            .read()
            .get(&session)
            .map(|wallet| {
                wallet
                    .iter()
                    .map(|(symbol, quantity)| Holding {
                        symbol: symbol.clone(),
                        quantity: *quantity,
                    })
                    .collect()
            })
            .unwrap_or_default();

        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        holdings
    }

    /// Value every holding of the session in `currency`.
    ///
    /// Prices are fetched concurrently after the lock is released. A failed
    /// lookup is logged and reported on its line with a zero value; it never
    /// fails the whole valuation.
    pub async fn valuation(
        &self,
        session: SessionId,
        currency: &str,
        exchange: &dyn ExchangeClient,
    ) -> Valuation {
        let holdings = self.holdings(session);

        let quotes = join_all(
            holdings
                .iter()
                .map(|h| exchange.get_price(&h.symbol, currency)),
        )
        .await;

        let lines = holdings
            .into_iter()
            .zip(quotes)
            .map(|(holding, quote)| match quote {
                Ok(quote) => ValuationLine::priced(holding.symbol, holding.quantity, quote.price),
                Err(e) => {
                    tracing::warn!(
                        session,
                        symbol = %holding.symbol,
                        exchange = exchange.name(),
                        "price lookup failed: {}", e
                    );
                    ValuationLine::unpriced(holding.symbol, holding.quantity, e.to_string())
                }
            })
            .collect();

        Valuation::new(currency, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockExchangeClient;
    use rust_decimal_macros::dec;

    const CHAT: SessionId = 42;

    #[test]
    fn test_deposit_then_full_withdraw_removes_symbol() {
        let ledger = Ledger::new();
        ledger.deposit(CHAT, "BTC", dec!(0.75)).unwrap();

        let outcome = ledger.withdraw(CHAT, "BTC", dec!(0.75)).unwrap();
        assert_eq!(outcome, Withdrawal::Removed);
        assert_eq!(ledger.balance(CHAT, "BTC"), None);
        assert!(ledger.holdings(CHAT).is_empty());
    }

    #[test]
    fn test_deposits_accumulate() {
        let split = Ledger::new();
        split.deposit(CHAT, "BTC", dec!(1.5)).unwrap();
        let balance = split.deposit(CHAT, "BTC", dec!(0.5)).unwrap();

        let whole = Ledger::new();
        let expected = whole.deposit(CHAT, "BTC", dec!(2.0)).unwrap();

        assert_eq!(balance, expected);
        assert_eq!(split.balance(CHAT, "BTC"), Some(dec!(2.0)));
    }

    #[test]
    fn test_partial_withdraw() {
        let ledger = Ledger::new();
        ledger.deposit(CHAT, "ETH", dec!(3)).unwrap();

        let outcome = ledger.withdraw(CHAT, "ETH", dec!(1.25)).unwrap();
        assert_eq!(outcome, Withdrawal::Remaining(dec!(1.75)));
        assert_eq!(ledger.balance(CHAT, "ETH"), Some(dec!(1.75)));
    }

    #[test]
    fn test_over_withdraw_leaves_wallet_unchanged() {
        let ledger = Ledger::new();
        ledger.deposit(CHAT, "ETH", dec!(1)).unwrap();

        let err = ledger.withdraw(CHAT, "ETH", dec!(10)).unwrap_err();
        assert!(matches!(
            err,
            WalletError::InsufficientBalance { ref symbol, available, requested }
                if symbol == "ETH" && available == dec!(1) && requested == dec!(10)
        ));
        assert_eq!(ledger.balance(CHAT, "ETH"), Some(dec!(1)));
    }

    #[test]
    fn test_withdraw_without_wallet() {
        let ledger = Ledger::new();

        let err = ledger.withdraw(CHAT, "ETH", dec!(10)).unwrap_err();
        assert!(matches!(err, WalletError::SymbolNotFound(ref s) if s == "ETH"));
        assert!(ledger.holdings(CHAT).is_empty());
        assert!(ledger.read().get(&CHAT).is_none());
    }

    #[test]
    fn test_withdraw_unheld_symbol() {
        let ledger = Ledger::new();
        ledger.deposit(CHAT, "BTC", dec!(1)).unwrap();

        let err = ledger.withdraw(CHAT, "ETH", dec!(1)).unwrap_err();
        assert!(matches!(err, WalletError::SymbolNotFound(_)));
        assert_eq!(ledger.holdings(CHAT).len(), 1);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let ledger = Ledger::new();
        assert!(matches!(
            ledger.deposit(CHAT, "BTC", dec!(-1)),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.deposit(CHAT, "BTC", Decimal::ZERO),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(ledger.read().get(&CHAT).is_none());

        ledger.deposit(CHAT, "BTC", dec!(1)).unwrap();
        assert!(ledger.withdraw(CHAT, "BTC", dec!(-5)).is_err());
        assert_eq!(ledger.balance(CHAT, "BTC"), Some(dec!(1)));
    }

    #[test]
    fn test_deposit_past_maximum_leaves_balance() {
        let ledger = Ledger::new();
        assert_eq!(ledger.deposit(CHAT, "BTC", MAX_AMOUNT).unwrap(), MAX_AMOUNT);

        assert!(matches!(
            ledger.deposit(CHAT, "BTC", dec!(0.0001)),
            Err(WalletError::InvalidAmount(_))
        ));
        // would overflow Decimal outright
        assert!(matches!(
            ledger.deposit(CHAT, "BTC", Decimal::MAX),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.deposit(7, "ETH", Decimal::MAX),
            Err(WalletError::InvalidAmount(_))
        ));

        assert_eq!(ledger.balance(CHAT, "BTC"), Some(MAX_AMOUNT));
        assert!(ledger.read().get(&7).is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let ledger = Ledger::new();
        assert!(!ledger.remove(CHAT, "DOGE"));

        ledger.deposit(CHAT, "DOGE", dec!(100)).unwrap();
        assert!(ledger.remove(CHAT, "DOGE"));
        assert!(!ledger.remove(CHAT, "DOGE"));
        assert_eq!(ledger.balance(CHAT, "DOGE"), None);
    }

    #[test]
    fn test_symbols_are_case_sensitive_and_sessions_isolated() {
        let ledger = Ledger::new();
        ledger.deposit(CHAT, "BTC", dec!(1)).unwrap();
        ledger.deposit(CHAT, "btc", dec!(2)).unwrap();
        ledger.deposit(7, "BTC", dec!(5)).unwrap();

        assert_eq!(ledger.balance(CHAT, "BTC"), Some(dec!(1)));
        assert_eq!(ledger.balance(CHAT, "btc"), Some(dec!(2)));
        assert_eq!(ledger.balance(7, "BTC"), Some(dec!(5)));
    }

    #[tokio::test]
    async fn test_empty_valuation_is_zero() {
        let ledger = Ledger::new();
        let exchange = MockExchangeClient::new();

        let valuation = ledger.valuation(CHAT, "RUB", &exchange).await;
        assert!(valuation.lines.is_empty());
        assert_eq!(valuation.total, Decimal::ZERO);
        assert_eq!(valuation.currency, "RUB");
        assert_eq!(exchange.price_requests(), 0);
    }

    #[tokio::test]
    async fn test_valuation_sums_holdings() {
        let ledger = Ledger::new();
        let exchange = MockExchangeClient::empty()
            .with_price("BTC", dec!(100))
            .with_price("ETH", dec!(10));
        ledger.deposit(CHAT, "BTC", dec!(2)).unwrap();
        ledger.deposit(CHAT, "ETH", dec!(0.5)).unwrap();

        let valuation = ledger.valuation(CHAT, "RUB", &exchange).await;
        assert_eq!(valuation.total, dec!(205));
        assert_eq!(valuation.lines[0].symbol, "BTC");
        assert_eq!(valuation.lines[1].value, dec!(5));
    }

    #[tokio::test]
    async fn test_failed_lookup_contributes_zero() {
        let ledger = Ledger::new();
        let exchange = MockExchangeClient::empty().with_price("BTC", dec!(100));
        ledger.deposit(CHAT, "BTC", dec!(1)).unwrap();
        ledger.deposit(CHAT, "NOPE", dec!(1000)).unwrap();

        let valuation = ledger.valuation(CHAT, "RUB", &exchange).await;
        assert_eq!(valuation.total, dec!(100));
        assert_eq!(valuation.failed_symbols(), vec!["NOPE"]);
        assert_eq!(exchange.price_requests(), 2);
        // holdings are untouched by a failed lookup
        assert_eq!(ledger.balance(CHAT, "NOPE"), Some(dec!(1000)));
    }

    #[tokio::test]
    async fn test_overflowing_value_is_reported_unpriced() {
        let ledger = Ledger::new();
        let exchange = MockExchangeClient::empty().with_price("BTC", Decimal::MAX);
        ledger.deposit(CHAT, "BTC", MAX_AMOUNT).unwrap();

        let valuation = ledger.valuation(CHAT, "RUB", &exchange).await;
        assert_eq!(valuation.total, Decimal::ZERO);
        assert_eq!(valuation.failed_symbols(), vec!["BTC"]);
        assert_eq!(
            valuation.to_string(),
            "BTC: 1000000000000000.0000 [price unavailable]\nTotal: 0.00 RUB"
        );
    }

    #[tokio::test]
    async fn test_concurrent_deposits() {
        let ledger = std::sync::Arc::new(Ledger::new());

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.deposit(CHAT, "SOL", dec!(0.1)) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(ledger.balance(CHAT, "SOL"), Some(dec!(5.0)));
    }
}
