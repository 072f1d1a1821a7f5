//! Trading signals service module.
//!
//! Technical indicators, per-timeframe classification and the
//! entry/stop-loss/take-profit generator.

pub mod classifier;
pub mod indicators;
pub mod recommendation;

pub use classifier::{aggregate, classify, classify_timeframe, Thresholds};
pub use indicators::{snapshot, try_snapshot, Indicator};
pub use recommendation::{recommend, RecommendationParams};
