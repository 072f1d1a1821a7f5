//! Aurum - gold price signal bot
//!
//! Multi-timeframe EMA/RSI signals on XAU/USD with ATR-based trade levels,
//! delivered over Telegram.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use bot::{Bot, BotState, Command};
pub use config::{Config, Settings};
pub use error::{AppError, Result};
pub use types::*;
