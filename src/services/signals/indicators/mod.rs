//! Technical indicator implementations.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerValue};
pub use ema::Ema;
pub use macd::{Macd, MacdValue};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::error::{AppError, Result};
use crate::types::{Candle, IndicatorSnapshot};

/// Trait for implementing technical indicators.
///
/// Candles must be in ascending chronological order (oldest first).
pub trait Indicator {
    type Output;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Minimum number of candle periods required for calculation.
    fn min_periods(&self) -> usize;

    /// Latest indicator value.
    /// Returns None if there is insufficient data.
    fn calculate(&self, candles: &[Candle]) -> Option<Self::Output>;
}

pub const EMA_FAST_PERIOD: usize = 20;
pub const EMA_SLOW_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;

/// Candles needed before every snapshot field is defined.
pub fn required_candles() -> usize {
    [
        Ema::new(EMA_FAST_PERIOD).min_periods(),
        Ema::new(EMA_SLOW_PERIOD).min_periods(),
        Rsi::new(RSI_PERIOD).min_periods(),
        Macd::default().min_periods(),
        BollingerBands::default().min_periods(),
        Atr::new(ATR_PERIOD).min_periods(),
    ]
    .into_iter()
    .max()
    .unwrap_or(EMA_SLOW_PERIOD)
}

/// Compute the full indicator snapshot, reporting why it is undefined.
pub fn try_snapshot(candles: &[Candle]) -> Result<IndicatorSnapshot> {
    let required = required_candles();
    let insufficient = || AppError::InsufficientHistory {
        required,
        available: candles.len(),
    };

    if candles.len() < required {
        return Err(insufficient());
    }

    let close = candles.last().ok_or_else(insufficient)?.close;
    let ema20 = Ema::new(EMA_FAST_PERIOD)
        .calculate(candles)
        .ok_or_else(insufficient)?;
    let ema50 = Ema::new(EMA_SLOW_PERIOD)
        .calculate(candles)
        .ok_or_else(insufficient)?;
    let rsi14 = Rsi::new(RSI_PERIOD)
        .calculate(candles)
        .ok_or_else(insufficient)?;
    let macd = Macd::default().calculate(candles).ok_or_else(insufficient)?;
    let bands = BollingerBands::default()
        .calculate(candles)
        .ok_or_else(insufficient)?;
    let atr14 = Atr::new(ATR_PERIOD)
        .calculate(candles)
        .ok_or_else(insufficient)?;

    Ok(IndicatorSnapshot {
        close,
        ema20,
        ema50,
        rsi14,
        macd: macd.macd,
        macd_signal: macd.signal,
        bollinger_upper: bands.upper,
        bollinger_middle: bands.middle,
        bollinger_lower: bands.lower,
        atr14,
    })
}

/// Indicator snapshot, or None when the series is empty or too short.
pub fn snapshot(candles: &[Candle]) -> Option<IndicatorSnapshot> {
    try_snapshot(candles).ok()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_required_candles() {
        assert_eq!(required_candles(), 50);
    }

    #[test]
    fn test_snapshot_empty_series() {
        assert!(snapshot(&[]).is_none());
        match try_snapshot(&[]) {
            Err(AppError::InsufficientHistory {
                required,
                available,
            }) => {
                assert_eq!(required, 50);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientHistory, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_short_series_never_panics() {
        for len in 0..50 {
            assert!(snapshot(&create_uptrend_candles(len)).is_none());
        }
        assert!(snapshot(&create_uptrend_candles(50)).is_some());
    }

    #[test]
    fn test_snapshot_uptrend() {
        let snap = snapshot(&create_uptrend_candles(120)).unwrap();
        assert!(snap.ema20 > snap.ema50);
        assert!(snap.rsi14 > 50.0);
        assert!(snap.macd > 0.0);
        assert!(snap.bollinger_upper >= snap.bollinger_middle);
        assert!(snap.bollinger_middle >= snap.bollinger_lower);
        assert!(snap.atr14 > 0.0);
        assert_eq!(snap.close, 100.0 + 119.0 * 1.5 + 1.0);
    }

    #[test]
    fn test_snapshot_downtrend() {
        let snap = snapshot(&create_downtrend_candles(120)).unwrap();
        assert!(snap.ema20 < snap.ema50);
        assert!(snap.rsi14 < 50.0);
        assert!(snap.macd < 0.0);
    }
}
