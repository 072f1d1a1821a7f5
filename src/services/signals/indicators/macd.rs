//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::Indicator;
use crate::types::{close_prices, Candle};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn name(&self) -> &str {
        "MACD"
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<MacdValue> {
        if candles.len() < self.min_periods() || self.fast_period > self.slow_period {
            return None;
        }

        let closes = close_prices(candles);
        let fast_ema = ema_series(&closes, self.fast_period);
        let slow_ema = ema_series(&closes, self.slow_period);

        if fast_ema.is_empty() || slow_ema.is_empty() {
            return None;
        }

        // Align the EMAs (fast starts earlier)
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .skip(offset)
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = ema_series(&macd_line, self.signal_period);

        let macd = *macd_line.last()?;
        let signal = *signal_line.last()?;

        Some(MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{
        candles_from_closes, create_downtrend_candles, create_uptrend_candles,
    };

    #[test]
    fn test_macd_min_periods() {
        assert_eq!(Macd::default().min_periods(), 35);
        assert!(Macd::default()
            .calculate(&create_uptrend_candles(34))
            .is_none());
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let value = Macd::default()
            .calculate(&candles_from_closes(&[2000.0; 60]))
            .unwrap();
        assert!(value.macd.abs() < 1e-9);
        assert!(value.signal.abs() < 1e-9);
        assert!(value.histogram.abs() < 1e-9);
    }

    #[test]
    fn test_macd_sign_follows_trend() {
        let up = Macd::default()
            .calculate(&create_uptrend_candles(60))
            .unwrap();
        assert!(up.macd > 0.0);

        let down = Macd::default()
            .calculate(&create_downtrend_candles(60))
            .unwrap();
        assert!(down.macd < 0.0);
    }
}
