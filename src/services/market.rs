//! Fetch-and-analyze pipeline.
//!
//! Every fetch failure is logged and degraded to "no data" for that piece;
//! the pipeline always produces an [`Analysis`].

use super::signals::classifier::{classify, Thresholds};
use super::signals::indicators::try_snapshot;
use super::signals::recommendation::{recommend, RecommendationParams};
use crate::config::{MarketDataConfig, RecommendationConfig, Settings};
use crate::error::AppError;
use crate::sources::MarketDataSource;
use crate::types::{Candle, IndicatorSnapshot, Recommendation, SignalReport, Timeframe};
use tracing::{debug, warn};

/// Raw market data gathered for one poll.
#[derive(Debug, Clone, Default)]
pub struct MarketView {
    /// Unadjusted spot price.
    pub spot: Option<f64>,
    /// Candles per classified timeframe, in configured order. Empty on failure.
    pub frames: Vec<(Timeframe, Vec<Candle>)>,
    /// Reference series for ATR and support/resistance.
    pub reference: Vec<Candle>,
    /// Daily candles for the average daily range.
    pub daily: Vec<Candle>,
}

/// Signals and recommendation derived from a [`MarketView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub spot: Option<f64>,
    /// Spot with the manual CFD adjustment applied.
    pub price: Option<f64>,
    pub signals: SignalReport,
    pub recommendation: Recommendation,
}

async fn fetch_candles(
    source: &dyn MarketDataSource,
    timeframe: Timeframe,
    size: usize,
) -> Vec<Candle> {
    match source.candles(timeframe, size).await {
        Ok(candles) => {
            debug!("Fetched {} {} candles", candles.len(), timeframe);
            candles
        }
        Err(e) => {
            warn!("Error fetching {} candles: {}", timeframe, e);
            Vec::new()
        }
    }
}

/// Fetch spot price, classified timeframes, reference and daily candles.
pub async fn fetch_view(source: &dyn MarketDataSource, config: &MarketDataConfig) -> MarketView {
    let spot = match source.spot_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("Error fetching spot price: {}", e);
            None
        }
    };

    let mut frames = Vec::with_capacity(config.timeframes.len());
    for &timeframe in &config.timeframes {
        let candles = fetch_candles(source, timeframe, config.candle_lookback).await;
        frames.push((timeframe, candles));
    }

    let reference = match frames
        .iter()
        .find(|(tf, _)| *tf == config.reference_timeframe)
    {
        Some((_, candles)) => candles.clone(),
        None => fetch_candles(source, config.reference_timeframe, config.candle_lookback).await,
    };

    let daily = if config.daily_lookback > 0 {
        fetch_candles(source, Timeframe::D1, config.daily_lookback).await
    } else {
        Vec::new()
    };

    MarketView {
        spot,
        frames,
        reference,
        daily,
    }
}

/// Indicator snapshot per timeframe; `None` where history is missing or short.
pub fn snapshots(view: &MarketView) -> Vec<(Timeframe, Option<IndicatorSnapshot>)> {
    view.frames
        .iter()
        .map(|(timeframe, candles)| {
            let snapshot = match try_snapshot(candles) {
                Ok(snapshot) => Some(snapshot),
                Err(AppError::InsufficientHistory {
                    required,
                    available,
                }) => {
                    debug!(
                        "{}: {} of {} candles, no snapshot",
                        timeframe, available, required
                    );
                    None
                }
                Err(e) => {
                    warn!("{}: snapshot failed: {}", timeframe, e);
                    None
                }
            };
            (*timeframe, snapshot)
        })
        .collect()
}

/// Classify and build the recommendation from a fetched view.
pub fn analyze(
    view: &MarketView,
    settings: &Settings,
    recommendation: &RecommendationConfig,
) -> Analysis {
    let price = view.spot.map(|spot| settings.adjust_price(spot));
    let signals = classify(&snapshots(view), &Thresholds::from_settings(settings));
    let recommendation = recommend(
        signals.call,
        price,
        &view.reference,
        &view.daily,
        &RecommendationParams::new(recommendation, settings),
    );

    Analysis {
        spot: view.spot,
        price,
        signals,
        recommendation,
    }
}
