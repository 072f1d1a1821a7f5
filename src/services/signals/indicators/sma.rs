//! Simple Moving Average (SMA) indicator.

use super::Indicator;
use crate::types::Candle;

/// SMA (Simple Moving Average) of closes over the trailing period.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

/// Mean of the last `period` values.
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(values.iter().rev().take(period).sum::<f64>() / period as f64)
}

impl Indicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        "SMA"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Option<f64> {
        if candles.len() < self.period || self.period == 0 {
            return None;
        }

        let sma = candles
            .iter()
            .rev()
            .take(self.period)
            .map(|c| c.close)
            .sum::<f64>()
            / self.period as f64;

        Some(sma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::candles_from_closes;

    #[test]
    fn test_sma_uses_trailing_window() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(Sma::new(2).calculate(&candles), Some(4.5));
        assert_eq!(Sma::new(5).calculate(&candles), Some(3.0));
        assert_eq!(Sma::new(6).calculate(&candles), None);
    }

    #[test]
    fn test_trailing_mean() {
        assert_eq!(trailing_mean(&[2.0, 4.0, 6.0], 2), Some(5.0));
        assert_eq!(trailing_mean(&[2.0], 2), None);
        assert_eq!(trailing_mean(&[2.0], 0), None);
    }
}
