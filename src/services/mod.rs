pub mod alert_gate;
pub mod market;
pub mod report;
pub mod signals;

pub use alert_gate::{AlertGate, AlertMemory, EmitReason, GatePolicy};
pub use market::{analyze, fetch_view, Analysis, MarketView};
