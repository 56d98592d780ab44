//! Candlestick Charts
//!
//! Fetches the last day of 30-minute candles for a pair and rasterizes them
//! into a PNG sized for chat delivery.

use chrono::{DateTime, Duration, Utc};
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use plotters::prelude::*;

use crate::error::{Result, WalletError};
use crate::exchange::ExchangeClient;
use crate::model::Candle;

pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 400;

/// How far back a chart reaches
pub const LOOKBACK_HOURS: i64 = 24;

/// Width of one candle on the time axis
const CANDLE_SPAN_MINUTES: i64 = 30;

/// Start of the chart window ending at `now`
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(LOOKBACK_HOURS)
}

/// Fetch recent candles for `symbol` in `currency` and render them to PNG bytes
pub async fn candle_chart(
    exchange: &dyn ExchangeClient,
    symbol: &str,
    currency: &str,
) -> Result<Vec<u8>> {
    let candles = exchange
        .get_candles(symbol, currency, window_start(Utc::now()))
        .await?;

    let symbol = symbol.to_string();
    let currency = currency.to_string();
    tokio::task::spawn_blocking(move || render_candles(&symbol, &currency, &candles))
        .await
        .map_err(|e| WalletError::Chart(format!("render task failed: {e}")))?
}

/// Draw `candles` as a candlestick chart and encode it as PNG
pub fn render_candles(symbol: &str, currency: &str, candles: &[Candle]) -> Result<Vec<u8>> {
    if candles.is_empty() {
        return Err(WalletError::InvalidData("no candles".into()));
    }

    let mut pixels = vec![0_u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    draw(&mut pixels, symbol, currency, candles).map_err(WalletError::Chart)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, CHART_WIDTH, CHART_HEIGHT, ColorType::Rgb8)
        .map_err(|e| WalletError::Chart(format!("png encoding failed: {e}")))?;
    Ok(png)
}

/// Price bounds across all candles, padded so flat series still get a range
fn price_range(candles: &[Candle]) -> (f64, f64) {
    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((high - low) * 0.05).max(high.abs() * 0.001).max(f64::EPSILON);
    (low - pad, high + pad)
}

fn draw(
    pixels: &mut [u8],
    symbol: &str,
    currency: &str,
    candles: &[Candle],
) -> std::result::Result<(), String> {
    let root = BitMapBackend::with_buffer(pixels, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let from = candles[0].open_time;
    let to = candles[candles.len() - 1].open_time + Duration::minutes(CANDLE_SPAN_MINUTES);
    let (low, high) = price_range(candles);

    let mut chart = ChartBuilder::on(&root)
        .caption(symbol, ("sans-serif", 24).into_font())
        .margin(12u32)
        .x_label_area_size(40u32)
        .y_label_area_size(80u32)
        .build_cartesian_2d(from..to, low..high)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc(format!("Price, {currency}"))
        .x_labels(8)
        .x_label_formatter(&|t: &DateTime<Utc>| t.format("%Y-%m-%d %H:%M").to_string())
        .draw()
        .map_err(|e| e.to_string())?;

    let body_width = candle_body_width(candles.len());
    chart
        .draw_series(candles.iter().map(|c| {
            CandleStick::new(
                c.open_time,
                c.open,
                c.high,
                c.low,
                c.close,
                GREEN.filled(),
                RED.filled(),
                body_width,
            )
        }))
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

/// Candle body width in pixels for `count` candles across the plot
fn candle_body_width(count: usize) -> u32 {
    let plot_width = CHART_WIDTH.saturating_sub(120);
    let per_candle = plot_width / u32::try_from(count.max(1)).unwrap_or(u32::MAX);
    (per_candle * 2 / 3).clamp(1, 15)
}
