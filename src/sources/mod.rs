//! External collaborators: the price/candle source and the chat transport.

pub mod telegram;
pub mod twelve_data;

pub use telegram::TelegramClient;
pub use twelve_data::TwelveDataClient;

use crate::error::Result;
use crate::types::{Candle, Timeframe};
use std::future::Future;
use std::pin::Pin;

/// Provider of the current price and OHLC history.
pub trait MarketDataSource: Send + Sync {
    /// Current spot price.
    fn spot_price(&self) -> Pin<Box<dyn Future<Output = Result<f64>> + Send + '_>>;

    /// Up to `size` candles for `timeframe`, ascending by time.
    fn candles(
        &self,
        timeframe: Timeframe,
        size: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>>> + Send + '_>>;
}

/// Delivers text to a recipient. Delivery is not acknowledged.
pub trait Notifier: Send + Sync {
    fn send_message<'a>(
        &'a self,
        chat_id: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
