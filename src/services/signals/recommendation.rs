//! Entry, stop-loss and take-profit generation.
//!
//! Levels are ATR-scaled from the current price and bounded by the
//! trailing support (lowest low) and resistance (highest high) of the
//! reference series. When no sensible levels exist, an [`Advisory`] is
//! returned instead; this never fails.

use super::indicators::{Atr, Indicator, ATR_PERIOD};
use crate::config::{RecommendationConfig, Settings, TargetPolicy};
use crate::types::{Advisory, AggregateCall, Candle, Direction, Recommendation, TradeLevels};

/// Multiplier used when volatility is low relative to the daily range.
pub const CALM_TP_MULTIPLIER: f64 = 1.5;
/// Default multiplier.
pub const DEFAULT_TP_MULTIPLIER: f64 = 2.0;

/// Inputs to the generator that do not come from market data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationParams {
    pub atr_period: usize,
    pub sr_window: usize,
    pub min_reference_candles: usize,
    pub tp_multiplier: Option<f64>,
    pub target_policy: TargetPolicy,
}

impl RecommendationParams {
    pub fn new(config: &RecommendationConfig, settings: &Settings) -> Self {
        Self {
            atr_period: ATR_PERIOD,
            sr_window: config.sr_window,
            min_reference_candles: config.min_reference_candles,
            tp_multiplier: settings.tp_multiplier,
            target_policy: settings.target_policy,
        }
    }

    /// Reference candles needed before levels are computed.
    pub fn required_candles(&self) -> usize {
        Atr::new(self.atr_period)
            .min_periods()
            .max(self.min_reference_candles)
    }
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self::new(&RecommendationConfig::default(), &Settings::default())
    }
}

/// Mean high-low range over daily candles.
pub fn average_daily_range(daily: &[Candle]) -> Option<f64> {
    if daily.is_empty() {
        return None;
    }
    Some(daily.iter().map(Candle::range).sum::<f64>() / daily.len() as f64)
}

/// (support, resistance) over the trailing `window` candles.
/// A window of zero uses the whole series.
pub fn support_resistance(candles: &[Candle], window: usize) -> Option<(f64, f64)> {
    let start = if window == 0 {
        0
    } else {
        candles.len().saturating_sub(window)
    };
    let tail = &candles[start..];
    if tail.is_empty() {
        return None;
    }

    let support = tail.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = tail.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    Some((support, resistance))
}

/// Take-profit ATR multiple: the configured value, or volatility-adjusted.
pub fn take_profit_multiplier(atr: f64, adr: Option<f64>, fixed: Option<f64>) -> f64 {
    if let Some(k) = fixed {
        return k;
    }
    match adr {
        Some(adr) if atr < adr / 2.0 => CALM_TP_MULTIPLIER,
        _ => DEFAULT_TP_MULTIPLIER,
    }
}

/// Generate a recommendation for the aggregate call at `price`.
pub fn recommend(
    call: AggregateCall,
    price: Option<f64>,
    reference: &[Candle],
    daily: &[Candle],
    params: &RecommendationParams,
) -> Recommendation {
    let Some(price) = price.filter(|p| p.is_finite()) else {
        return Recommendation::Advisory(Advisory::NoPrice);
    };

    let required = params.required_candles();
    let insufficient = Recommendation::Advisory(Advisory::InsufficientData {
        required,
        available: reference.len(),
    });
    if reference.len() < required {
        return insufficient;
    }

    let (Some(atr), Some((support, resistance))) = (
        Atr::new(params.atr_period).calculate(reference),
        support_resistance(reference, params.sr_window),
    ) else {
        return insufficient;
    };

    let Some(direction) = call.direction() else {
        return Recommendation::Advisory(Advisory::Uncertain);
    };

    let adr = average_daily_range(daily);
    let k = take_profit_multiplier(atr, adr, params.tp_multiplier);
    let exceeds_adr = |reward: f64| adr.is_some_and(|adr| reward > adr);

    let (stop_loss, take_profit) = match direction {
        Direction::Buy => {
            let raw_tp = price + k * atr;
            if params.target_policy == TargetPolicy::Strict
                && (raw_tp > resistance || exceeds_adr(raw_tp - price))
            {
                return Recommendation::Advisory(Advisory::UnrealisticTarget { direction });
            }
            let raw_sl = price - atr;
            let sl = if support < price { raw_sl.max(support) } else { raw_sl };
            (sl, raw_tp.min(resistance))
        }
        Direction::Sell => {
            let raw_tp = price - k * atr;
            if params.target_policy == TargetPolicy::Strict
                && (raw_tp < support || exceeds_adr(price - raw_tp))
            {
                return Recommendation::Advisory(Advisory::UnrealisticTarget { direction });
            }
            let raw_sl = price + atr;
            let sl = if resistance > price { raw_sl.min(resistance) } else { raw_sl };
            (sl, raw_tp.max(support))
        }
    };

    let has_room = match direction {
        Direction::Buy => take_profit > price,
        Direction::Sell => take_profit < price,
    };
    if !has_room {
        return Recommendation::Advisory(Advisory::NoRoom { direction });
    }

    Recommendation::Levels(TradeLevels {
        direction,
        entry: price,
        stop_loss,
        take_profit,
        atr,
        adr,
    })
}
