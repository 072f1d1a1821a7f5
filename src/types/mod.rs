pub mod candle;
pub mod chat;
pub mod recommendation;
pub mod signals;

pub use candle::*;
pub use chat::*;
pub use recommendation::*;
pub use signals::*;
