use super::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry, stop-loss and take-profit levels for a directional call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLevels {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub atr: f64,
    /// Average daily range, when daily candles were available.
    pub adr: Option<f64>,
}

impl TradeLevels {
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry).abs()
    }
}

/// Reason no levels were produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Current price could not be fetched.
    NoPrice,
    /// Reference candle history is empty or too short.
    InsufficientData { required: usize, available: usize },
    /// No aggregate direction.
    Uncertain,
    /// Target sits beyond support/resistance or exceeds the daily range.
    UnrealisticTarget { direction: Direction },
    /// Support/resistance leaves no distance to a target.
    NoRoom { direction: Direction },
}

/// Output of the recommendation generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Levels(TradeLevels),
    Advisory(Advisory),
}

impl Recommendation {
    pub fn levels(&self) -> Option<&TradeLevels> {
        match self {
            Recommendation::Levels(levels) => Some(levels),
            Recommendation::Advisory(_) => None,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::NoPrice => {
                write!(f, "⚠️ Could not compute a recommendation (no current price)")
            }
            Advisory::InsufficientData { .. } => {
                write!(f, "⚠️ Insufficient data to compute a recommendation")
            }
            Advisory::Uncertain => write!(f, "🤔 Uncertain market."),
            Advisory::UnrealisticTarget { direction } => {
                let (icon, bound) = match direction {
                    Direction::Buy => ("📈", "resistance"),
                    Direction::Sell => ("📉", "support"),
                };
                write!(
                    f,
                    "{} {} detected, but the target is unrealistic ({} too close or outside the daily range). Better to wait.",
                    icon, direction, bound
                )
            }
            Advisory::NoRoom { direction } => {
                let icon = match direction {
                    Direction::Buy => "📈",
                    Direction::Sell => "📉",
                };
                write!(
                    f,
                    "{} {} detected, but price is already at the target bound. Better to wait.",
                    icon, direction
                )
            }
        }
    }
}

impl fmt::Display for TradeLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.direction {
            Direction::Buy => "📈",
            Direction::Sell => "📉",
        };
        write!(
            f,
            "{} {} CFD\n🎯 Entry: {:.2}\n🛑 SL: {:.2}\n✅ TP: {:.2} (ATR={:.2}",
            icon, self.direction, self.entry, self.stop_loss, self.take_profit, self.atr
        )?;
        if let Some(adr) = self.adr {
            write!(f, ", ADR={:.2}", adr)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Levels(levels) => levels.fmt(f),
            Recommendation::Advisory(advisory) => advisory.fmt(f),
        }
    }
}
