//! coin-wallet-bot
//!
//! Telegram bot that keeps a per-chat crypto wallet in memory, values it
//! against a fiat currency and draws 24h candlestick charts.
//!
//! Long polling only: each update is handled on its own task so slow
//! exchange calls never hold up other chats.

mod config;
mod handlers;
mod state;
mod telegram;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_core::{
    Interpreter, Ledger,
    exchange::{BinanceClient, BinanceConfig, ExchangeClient},
};

use crate::config::BotConfig;
use crate::handlers::handle_update;
use crate::state::AppState;
use crate::telegram::TelegramClient;

/// Pause after a failed `getUpdates` before polling again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if dotenv.is_err() {
        tracing::info!("No .env file found");
    }

    let config = BotConfig::from_env().context("startup configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let telegram = Arc::new(
        TelegramClient::new(&config.telegram_api_url, &config.bot_token, config.http_timeout_secs)
            .context("creating Telegram client")?,
    );
    let me = telegram.get_me().await.context("authorizing bot token")?;
    tracing::info!(
        "Authorized on account {}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let exchange: Arc<dyn ExchangeClient> = Arc::new(BinanceClient::new(BinanceConfig {
        base_url: config.exchange_api_url.clone(),
        timeout_secs: config.http_timeout_secs,
    })?);
    tracing::info!(
        exchange = exchange.name(),
        url = %config.exchange_api_url,
        currency = %config.default_currency,
        "price source ready"
    );

    let interpreter = Interpreter::new(Arc::new(Ledger::new()), exchange)
        .with_currency(config.default_currency.clone());

    let state = AppState {
        interpreter,
        transport: telegram.clone(),
    };

    tokio::select! {
        () = poll(state, &telegram, config.poll_timeout_secs) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for shutdown signal")?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

/// Long-poll Telegram forever, spawning a task per update
async fn poll(state: AppState, telegram: &TelegramClient, timeout_secs: u64) {
    let mut offset = 0_i64;

    loop {
        let updates = match telegram.get_updates(offset, timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            tokio::spawn(handle_update(state.clone(), update));
        }
    }
}
