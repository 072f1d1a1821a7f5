use crate::config::Settings;
use crate::services::AlertGate;

/// Mutable bot state. Owned by the bot task; jobs and command handlers
/// borrow it in turn.
#[derive(Debug, Default)]
pub struct BotState {
    pub settings: Settings,
    recipients: Vec<String>,
    pub alert_gate: AlertGate,
    /// Last unadjusted spot price, used by `setprice`.
    pub last_spot: Option<f64>,
}

impl BotState {
    pub fn new(settings: Settings, recipients: impl IntoIterator<Item = String>) -> Self {
        let mut state = Self {
            settings,
            ..Self::default()
        };
        for id in recipients {
            state.add_recipient(&id);
        }
        state
    }

    /// Alert recipients in insertion order.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn is_recipient(&self, id: &str) -> bool {
        self.recipients.iter().any(|r| r == id)
    }

    /// Add a recipient. Returns false if it was already present.
    pub fn add_recipient(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() || self.is_recipient(id) {
            return false;
        }
        self.recipients.push(id.to_string());
        true
    }
}
