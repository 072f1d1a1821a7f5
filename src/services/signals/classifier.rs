//! Rule-based signal classification over multiple timeframes.

use crate::config::Settings;
use crate::types::{
    AggregateCall, IndicatorSnapshot, SignalReport, Timeframe, TimeframeLabel, TimeframeSignal,
};

/// Timeframes that must agree before a directional call is made.
pub const MIN_AGREEING_TIMEFRAMES: usize = 2;

/// RSI bounds applied to the EMA crossover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// BUY requires RSI strictly below this.
    pub buy_rsi_ceiling: f64,
    /// SELL requires RSI strictly above this.
    pub sell_rsi_floor: f64,
}

impl Thresholds {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            buy_rsi_ceiling: settings.buy_rsi_ceiling(),
            sell_rsi_floor: settings.sell_rsi_floor(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Label one timeframe from its latest snapshot.
pub fn classify_timeframe(
    snapshot: Option<&IndicatorSnapshot>,
    thresholds: &Thresholds,
) -> TimeframeLabel {
    let Some(snap) = snapshot else {
        return TimeframeLabel::NoData;
    };

    if snap.ema20 > snap.ema50 && snap.rsi14 < thresholds.buy_rsi_ceiling {
        TimeframeLabel::Buy
    } else if snap.ema20 < snap.ema50 && snap.rsi14 > thresholds.sell_rsi_floor {
        TimeframeLabel::Sell
    } else {
        TimeframeLabel::Neutral
    }
}

/// Aggregate per-timeframe labels. BUY is checked before SELL.
pub fn aggregate<'a, I>(labels: I) -> AggregateCall
where
    I: IntoIterator<Item = &'a TimeframeLabel>,
{
    let (buys, sells) = labels
        .into_iter()
        .fold((0usize, 0usize), |(b, s), label| match label {
            TimeframeLabel::Buy => (b + 1, s),
            TimeframeLabel::Sell => (b, s + 1),
            TimeframeLabel::Neutral | TimeframeLabel::NoData => (b, s),
        });

    if buys >= MIN_AGREEING_TIMEFRAMES {
        AggregateCall::Buy
    } else if sells >= MIN_AGREEING_TIMEFRAMES {
        AggregateCall::Sell
    } else {
        AggregateCall::Indecisive
    }
}

/// Classify every timeframe and aggregate, preserving input order.
pub fn classify(
    frames: &[(Timeframe, Option<IndicatorSnapshot>)],
    thresholds: &Thresholds,
) -> SignalReport {
    let timeframes: Vec<TimeframeSignal> = frames
        .iter()
        .map(|(timeframe, snapshot)| TimeframeSignal {
            timeframe: *timeframe,
            label: classify_timeframe(snapshot.as_ref(), thresholds),
            rsi: snapshot.as_ref().map(|s| s.rsi14),
        })
        .collect();

    let call = aggregate(timeframes.iter().map(|s| &s.label));

    SignalReport { call, timeframes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ema20: f64, ema50: f64, rsi14: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            close: 2010.0,
            ema20,
            ema50,
            rsi14,
            macd: 0.0,
            macd_signal: 0.0,
            bollinger_upper: 2020.0,
            bollinger_middle: 2010.0,
            bollinger_lower: 2000.0,
            atr14: 3.0,
        }
    }

    #[test]
    fn test_buy_label() {
        let t = Thresholds::default();
        assert_eq!(
            classify_timeframe(Some(&snap(2010.0, 2005.0, 50.0)), &t),
            TimeframeLabel::Buy
        );
    }

    #[test]
    fn test_buy_disqualified_by_high_rsi() {
        let t = Thresholds::default();
        assert_eq!(
            classify_timeframe(Some(&snap(2010.0, 2005.0, 80.0)), &t),
            TimeframeLabel::Neutral
        );
        // Ceiling is exclusive
        assert_eq!(
            classify_timeframe(Some(&snap(2010.0, 2005.0, 65.0)), &t),
            TimeframeLabel::Neutral
        );
    }

    #[test]
    fn test_sell_label() {
        let t = Thresholds::default();
        assert_eq!(
            classify_timeframe(Some(&snap(2000.0, 2005.0, 50.0)), &t),
            TimeframeLabel::Sell
        );
        assert_eq!(
            classify_timeframe(Some(&snap(2000.0, 2005.0, 35.0)), &t),
            TimeframeLabel::Neutral
        );
    }

    #[test]
    fn test_equal_emas_neutral() {
        let t = Thresholds::default();
        assert_eq!(
            classify_timeframe(Some(&snap(2005.0, 2005.0, 50.0)), &t),
            TimeframeLabel::Neutral
        );
    }

    #[test]
    fn test_no_data_label() {
        assert_eq!(
            classify_timeframe(None, &Thresholds::default()),
            TimeframeLabel::NoData
        );
    }

    #[test]
    fn test_thresholds_follow_settings() {
        let mut settings = Settings::default();
        settings.rsi_high = 90.0;
        let t = Thresholds::from_settings(&settings);
        assert_eq!(t.buy_rsi_ceiling, 85.0);
        assert_eq!(
            classify_timeframe(Some(&snap(2010.0, 2005.0, 80.0)), &t),
            TimeframeLabel::Buy
        );
    }

    #[test]
    fn test_aggregate_exhaustive_three_timeframes() {
        use TimeframeLabel::*;
        let all = [Buy, Sell, Neutral, NoData];
        for a in all {
            for b in all {
                for c in all {
                    let labels = [a, b, c];
                    let buys = labels.iter().filter(|l| **l == Buy).count();
                    let sells = labels.iter().filter(|l| **l == Sell).count();
                    let expected = if buys >= 2 {
                        AggregateCall::Buy
                    } else if sells >= 2 {
                        AggregateCall::Sell
                    } else {
                        AggregateCall::Indecisive
                    };
                    assert_eq!(aggregate(labels.iter()), expected, "{:?}", labels);
                }
            }
        }
    }

    #[test]
    fn test_aggregate_buy_wins_tie() {
        use TimeframeLabel::*;
        assert_eq!(aggregate([Buy, Sell, Buy, Sell].iter()), AggregateCall::Buy);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(std::iter::empty()), AggregateCall::Indecisive);
    }

    #[test]
    fn test_two_of_three_qualifying_is_buy() {
        let frames = vec![
            (Timeframe::M1, Some(snap(2010.0, 2005.0, 50.0))),
            (Timeframe::M5, Some(snap(2010.0, 2005.0, 50.0))),
            (Timeframe::M15, Some(snap(2010.0, 2005.0, 80.0))),
        ];
        let report = classify(&frames, &Thresholds::default());
        assert_eq!(report.call, AggregateCall::Buy);
        assert_eq!(report.count(TimeframeLabel::Buy), 2);
        assert_eq!(report.timeframes[2].label, TimeframeLabel::Neutral);
        assert_eq!(report.timeframes[2].rsi, Some(80.0));
    }

    #[test]
    fn test_missing_timeframes_are_not_counted() {
        let frames = vec![
            (Timeframe::M1, None),
            (Timeframe::M5, Some(snap(2000.0, 2005.0, 50.0))),
            (Timeframe::M15, None),
        ];
        let report = classify(&frames, &Thresholds::default());
        assert_eq!(report.call, AggregateCall::Indecisive);
        assert_eq!(report.count(TimeframeLabel::NoData), 2);
        assert_eq!(report.timeframes[0].rsi, None);
        assert_eq!(report.timeframes[1].timeframe, Timeframe::M5);
    }
}
