//! Bot Configuration
//!
//! Read from the process environment (after `.env` is loaded).

use std::fmt;

use thiserror::Error;

use portfolio_core::DEFAULT_CURRENCY;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Not found environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,

    /// Currency for SHOW and GRAPH
    pub default_currency: String,

    pub exchange_api_url: String,

    pub telegram_api_url: String,

    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout_secs: u64,

    /// Timeout for exchange requests and Telegram sends
    pub http_timeout_secs: u64,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("default_currency", &self.default_currency)
            .field("exchange_api_url", &self.exchange_api_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; `BOT_TOKEN` is required
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let secs = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value }),
                None => Ok(default),
            }
        };

        Ok(Self {
            bot_token,
            default_currency: lookup("DEFAULT_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.into()),
            exchange_api_url: lookup("EXCHANGE_API_URL")
                .unwrap_or_else(|| "https://api.binance.com".into()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".into()),
            poll_timeout_secs: secs("POLL_TIMEOUT_SECS", 60)?,
            http_timeout_secs: secs("HTTP_TIMEOUT_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_token_is_required() {
        let err = BotConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));

        let err = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.default_currency, "RUB");
        assert_eq!(config.exchange_api_url, "https://api.binance.com");
        assert_eq!(config.poll_timeout_secs, 60);
        assert!(!format!("{config:?}").contains("123:abc"));
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("DEFAULT_CURRENCY", "USD"),
            ("POLL_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.poll_timeout_secs, 5);

        let err = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "HTTP_TIMEOUT_SECS", .. }));
    }
}
