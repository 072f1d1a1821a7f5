use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle timeframe polled from the price source.
///
/// Ordered from shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Parse from a short label ("5m") or a Twelve Data interval ("5min").
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Some(Self::M1),
            "5m" | "5min" => Some(Self::M5),
            "15m" | "15min" => Some(Self::M15),
            "30m" | "30min" => Some(Self::M30),
            "1h" | "60m" => Some(Self::H1),
            "4h" => Some(Self::H4),
            "1d" | "1day" | "daily" => Some(Self::D1),
            _ => None,
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    /// Interval string understood by the Twelve Data API.
    pub fn twelve_data_interval(&self) -> &'static str {
        match self {
            Self::M1 => "1min",
            Self::M5 => "5min",
            Self::M15 => "15min",
            Self::M30 => "30min",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// OHLC candle. Series are kept ascending by `time` (oldest first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since the epoch.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Extract close prices from a slice of candles.
pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
