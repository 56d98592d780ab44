//! Chat Commands
//!
//! A message is a whitespace-delimited line. The first token selects the
//! command (case-sensitive, exact match); the rest are its arguments.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{Result, WalletError};
use crate::model::MAX_AMOUNT;

/// A parsed chat command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `ADD <symbol> <amount>`
    Deposit { symbol: String, amount: Decimal },

    /// `SUB <symbol> <amount>`
    Withdraw { symbol: String, amount: Decimal },

    /// `DEL <symbol>`
    Remove { symbol: String },

    /// `SHOW`
    Valuation,

    /// `GRAPH <symbol>`
    Chart { symbol: String },

    /// Anything else, verb kept for logging
    Unrecognized(String),
}

impl Command {
    /// Parse a message line.
    ///
    /// Unknown verbs are not an error; wrong arity or a bad amount is.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return Ok(Self::Unrecognized(String::new()));
        };

        let arity = match verb {
            "ADD" | "SUB" => 2,
            "DEL" | "GRAPH" => 1,
            "SHOW" => 0,
            other => return Ok(Self::Unrecognized(other.to_string())),
        };
        if args.len() != arity {
            return Err(WalletError::MalformedCommand(tokens.join(" ")));
        }

        let command = match verb {
            "ADD" => Self::Deposit {
                symbol: args[0].to_string(),
                amount: parse_amount(args[1])?,
            },
            "SUB" => Self::Withdraw {
                symbol: args[0].to_string(),
                amount: parse_amount(args[1])?,
            },
            "DEL" => Self::Remove {
                symbol: args[0].to_string(),
            },
            "GRAPH" => Self::Chart {
                symbol: args[0].to_string(),
            },
            _ => Self::Valuation,
        };
        Ok(command)
    }

    /// Verb as typed by the user
    pub fn verb(&self) -> &str {
        match self {
            Self::Deposit { .. } => "ADD",
            Self::Withdraw { .. } => "SUB",
            Self::Remove { .. } => "DEL",
            Self::Valuation => "SHOW",
            Self::Chart { .. } => "GRAPH",
            Self::Unrecognized(verb) => verb,
        }
    }
}

/// Parse an amount in `(0, MAX_AMOUNT]`; plain and scientific notation are accepted
fn parse_amount(raw: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| WalletError::InvalidAmount(raw.to_string()))?;

    if amount <= Decimal::ZERO || amount > MAX_AMOUNT {
        return Err(WalletError::InvalidAmount(raw.to_string()));
    }
    Ok(amount)
}
