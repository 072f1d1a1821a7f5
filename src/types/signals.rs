use super::Timeframe;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest indicator values for one candle series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub atr14: f64,
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal label for a single timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeframeLabel {
    Buy,
    Sell,
    Neutral,
    NoData,
}

/// Overall call across timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateCall {
    Buy,
    Sell,
    Indecisive,
}

impl AggregateCall {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            AggregateCall::Buy => Some(Direction::Buy),
            AggregateCall::Sell => Some(Direction::Sell),
            AggregateCall::Indecisive => None,
        }
    }
}

/// Classified signal for one timeframe, kept with its RSI for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeSignal {
    pub timeframe: Timeframe,
    pub label: TimeframeLabel,
    pub rsi: Option<f64>,
}

/// Aggregate call plus the per-timeframe labels that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub call: AggregateCall,
    pub timeframes: Vec<TimeframeSignal>,
}

impl SignalReport {
    pub fn count(&self, label: TimeframeLabel) -> usize {
        self.timeframes.iter().filter(|s| s.label == label).count()
    }
}
