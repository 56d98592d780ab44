//! Error Types for the Wallet Tracker

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    /// Wrong verb arity or unparsable command line
    #[error("Incorrect command: {0}")]
    MalformedCommand(String),

    /// Amount is not a number or not strictly positive
    #[error("Incorrect command format: {0}")]
    InvalidAmount(String),

    #[error("Wallet doesn't contain symbol: {0}!")]
    SymbolNotFound(String),

    #[error("Not enough amount on account: {symbol} (have {available}, requested {requested})")]
    InsufficientBalance {
        symbol: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Venue answered with a nonzero status code for the pair
    #[error("Symbol is incorrect: {0}")]
    UnknownPair(String),

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Errors caused by the venue or the network rather than by the user
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UnknownPair(_)
                | Self::Exchange(_)
                | Self::InvalidData(_)
                | Self::Network(_)
                | Self::Serialization(_)
        )
    }

    /// Text sent back to the chat for this error
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientBalance { symbol, .. } => {
                format!("Not enough amount on account: {symbol}")
            }
            Self::Network(_) | Self::Serialization(_) | Self::Exchange(_) => {
                "Exchange is unavailable, try again later".into()
            }
            Self::Chart(_) | Self::Config(_) => "An unexpected error occurred.".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_user_message_hides_amounts() {
        let err = WalletError::InsufficientBalance {
            symbol: "ETH".into(),
            available: dec!(1),
            requested: dec!(10),
        };
        assert_eq!(err.user_message(), "Not enough amount on account: ETH");
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_upstream_classification() {
        assert!(WalletError::UnknownPair("FOORUB".into()).is_upstream());
        assert!(WalletError::InvalidData("row 3".into()).is_upstream());
        assert!(!WalletError::SymbolNotFound("ETH".into()).is_upstream());
        assert_eq!(
            WalletError::SymbolNotFound("ETH".into()).user_message(),
            "Wallet doesn't contain symbol: ETH!"
        );
    }
}
