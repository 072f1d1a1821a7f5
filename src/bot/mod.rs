//! The bot task: scheduled jobs and command handling over one owned state.

pub mod commands;
pub mod state;

pub use commands::Command;
pub use state::BotState;

use crate::config::Config;
use crate::error::AppError;
use crate::services::{analyze, fetch_view, report, Analysis, EmitReason, GatePolicy};
use crate::sources::{MarketDataSource, Notifier};
use crate::types::ChatMessage;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const SET_USAGE: &str = "Usage: /set <param> <value>. Use /config to list parameters.";

fn schedule(first_delay_secs: u64, every_secs: u64) -> Interval {
    let period = Duration::from_secs(every_secs.max(1));
    let mut ticker = interval_at(Instant::now() + Duration::from_secs(first_delay_secs), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Gold signal bot.
pub struct Bot {
    config: Config,
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    state: BotState,
}

impl Bot {
    pub fn new(
        config: Config,
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = BotState::new(config.settings.clone(), config.chat_ids.clone());
        Self {
            config,
            source,
            notifier,
            state,
        }
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    fn symbol(&self) -> &str {
        &self.config.market.symbol
    }

    /// Fetch and analyze the market, remembering the spot price.
    pub async fn analyze(&mut self) -> Analysis {
        let view = fetch_view(self.source.as_ref(), &self.config.market).await;
        if view.spot.is_some() {
            self.state.last_spot = view.spot;
        }
        analyze(&view, &self.state.settings, &self.config.recommendation)
    }

    async fn send(&self, chat_id: &str, text: &str) -> bool {
        match self.notifier.send_message(chat_id, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send message to {}: {}", chat_id, e);
                false
            }
        }
    }

    /// Send `text` to every recipient. Returns how many sends succeeded.
    async fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        for chat_id in self.state.recipients() {
            if self.send(chat_id, text).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Scheduled job: send price, signals and recommendation to all recipients.
    pub async fn market_summary(&mut self) -> usize {
        if self.state.recipients().is_empty() {
            debug!("No recipients, skipping market summary");
            return 0;
        }
        let analysis = self.analyze().await;
        let text = report::market_summary(self.symbol(), &analysis, &self.state.settings);
        let delivered = self.broadcast(&text).await;
        info!(
            "Market summary ({:?}) sent to {}/{} recipients",
            analysis.signals.call,
            delivered,
            self.state.recipients().len()
        );
        delivered
    }

    /// Scheduled job: alert recipients when a directional call passes the gate.
    pub async fn opportunity_check(&mut self, now: DateTime<Utc>) -> Option<EmitReason> {
        let analysis = self.analyze().await;
        let Some(price) = analysis.price else {
            warn!("Opportunity check skipped: no current price");
            return None;
        };

        let policy = GatePolicy::from_settings(&self.state.settings);
        let reason = self
            .state
            .alert_gate
            .admit(analysis.signals.call, price, now, &policy);

        match reason {
            Some(reason) => {
                let text = report::opportunity_alert(self.symbol(), &analysis);
                let delivered = self.broadcast(&text).await;
                info!(
                    "Opportunity alert {:?} at {:.2} ({:?}) sent to {} recipients",
                    analysis.signals.call, price, reason, delivered
                );
                if let Some(levels) = analysis.recommendation.levels() {
                    debug!(
                        "Alert levels: risk {:.2}, reward {:.2}",
                        levels.risk(),
                        levels.reward()
                    );
                }
            }
            None => debug!(
                "No opportunity alert ({:?} at {:.2})",
                analysis.signals.call, price
            ),
        }
        reason
    }

    fn set_param(&mut self, name: Option<String>, value: Option<String>) -> String {
        let (Some(name), Some(value)) = (name, value) else {
            return format!("⚠️ {}", SET_USAGE);
        };
        match self.state.settings.set(&name, &value) {
            Ok(value) => {
                info!("Parameter {} set to {}", name, value);
                format!("✅ {} = {}", name.to_lowercase(), value)
            }
            Err(AppError::UnknownParameter(name)) => {
                format!("❌ Unknown parameter '{}'. Use /config to list parameters.", name)
            }
            Err(e) => format!("⚠️ {}\n{}", e, SET_USAGE),
        }
    }

    fn set_price(&mut self, value: Option<String>) -> String {
        let Some(spot) = self.state.last_spot else {
            return "⚠️ No spot price loaded yet. Use /price first.".to_string();
        };
        let Some(broker) = value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
        else {
            return "⚠️ Invalid value. Usage: /setprice <broker price>".to_string();
        };

        let adjustment = broker - spot;
        self.state.settings.manual_cfd_adjustment = Some(adjustment);
        info!("CFD adjustment set to {:.2}", adjustment);
        format!(
            "✅ CFD adjustment set to {:+.2} (broker {:.2}, spot {:.2})",
            adjustment, broker, spot
        )
    }

    /// Execute a command for `chat_id` and return the reply.
    pub async fn execute(&mut self, chat_id: &str, command: Command) -> String {
        match command {
            Command::Price => {
                let analysis = self.analyze().await;
                report::market_summary(self.symbol(), &analysis, &self.state.settings)
            }
            Command::Opportunity => {
                let analysis = self.analyze().await;
                report::opportunity_report(self.symbol(), &analysis)
            }
            Command::AddId(None) => "⚠️ Usage: /addid <chat id>".to_string(),
            Command::AddId(Some(id)) => {
                if self.state.add_recipient(&id) {
                    info!("Recipient {} added by {}", id, chat_id);
                    format!("✅ Chat ID {} added.", id)
                } else {
                    format!("ℹ️ Chat ID {} is already present.", id)
                }
            }
            Command::ListIds => report::recipients_listing(self.state.recipients()),
            Command::Config => report::settings_listing(&self.state.settings),
            Command::Set { name, value } => self.set_param(name, value),
            Command::SetPrice(value) => self.set_price(value),
            Command::Help => report::HELP_TEXT.to_string(),
            Command::Unknown(name) => format!("❓ Unknown command /{}. Try /help.", name),
        }
    }

    /// Handle an incoming chat message, replying to its chat.
    /// Returns the reply, or `None` when the message was ignored.
    pub async fn handle_message(&mut self, message: ChatMessage) -> Option<String> {
        let command = Command::parse(&message.text)?;
        if self.config.command_allow_list_only && !self.state.is_recipient(&message.chat_id) {
            debug!("Ignoring command from unlisted chat {}", message.chat_id);
            return None;
        }

        debug!("Executing {:?} for {}", command, message.chat_id);
        let reply = self.execute(&message.chat_id, command).await;
        self.send(&message.chat_id, &reply).await;
        Some(reply)
    }

    /// Run scheduled jobs and commands until `shutdown` resolves.
    ///
    /// Jobs run one at a time. Ticks missed while a job runs collapse into
    /// a single late run, after which the schedule realigns.
    pub async fn run<F>(mut self, mut commands: mpsc::Receiver<ChatMessage>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut summary_ticks = schedule(
            self.config.schedule.market_summary_first_delay_secs,
            self.config.schedule.market_summary_interval_secs,
        );
        let mut opportunity_ticks = schedule(
            self.config.schedule.opportunity_first_delay_secs,
            self.config.schedule.opportunity_interval_secs,
        );
        let mut commands_open = true;
        tokio::pin!(shutdown);

        info!(
            "Bot started: {} recipients, summary every {}s, opportunity check every {}s",
            self.state.recipients().len(),
            self.config.schedule.market_summary_interval_secs,
            self.config.schedule.opportunity_interval_secs
        );

        loop {
            tokio::select! {
                _ = summary_ticks.tick() => {
                    self.market_summary().await;
                }
                _ = opportunity_ticks.tick() => {
                    self.opportunity_check(Utc::now()).await;
                }
                message = commands.recv(), if commands_open => match message {
                    Some(message) => {
                        self.handle_message(message).await;
                    }
                    None => {
                        warn!("Command channel closed, continuing with scheduled jobs only");
                        commands_open = false;
                    }
                },
                _ = &mut shutdown => {
                    info!("Bot received shutdown signal");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_merges_missed_ticks() {
        let ticker = schedule(60, 300);
        assert_eq!(ticker.period(), Duration::from_secs(300));
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Skip);
    }

    #[tokio::test]
    async fn test_schedule_floors_zero_period() {
        let ticker = schedule(0, 0);
        assert_eq!(ticker.period(), Duration::from_secs(1));
    }
}
