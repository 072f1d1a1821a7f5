use crate::error::{AppError, Result};
use crate::types::Timeframe;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Telegram Bot API configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token. Required to run the bot.
    pub token: Option<String>,
    /// Bot API base URL.
    pub api_url: String,
    /// Long-poll timeout for getUpdates (seconds).
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

/// Price and candle source configuration.
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    /// Twelve Data base URL.
    pub api_url: String,
    /// Twelve Data API key.
    pub api_key: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Timeframes classified on every poll, shortest first.
    pub timeframes: Vec<Timeframe>,
    /// Timeframe used for ATR and support/resistance.
    pub reference_timeframe: Timeframe,
    /// Candles requested per timeframe.
    pub candle_lookback: usize,
    /// Daily candles requested for the average daily range.
    pub daily_lookback: usize,
    /// HTTP request timeout (seconds).
    pub http_timeout_secs: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.twelvedata.com".to_string(),
            api_key: "demo".to_string(),
            symbol: "XAU/USD".to_string(),
            timeframes: vec![Timeframe::M1, Timeframe::M5, Timeframe::M15],
            reference_timeframe: Timeframe::M15,
            candle_lookback: 200,
            daily_lookback: 10,
            http_timeout_secs: 30,
        }
    }
}

/// Periodic job configuration.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Broadcast market summary interval (seconds).
    pub market_summary_interval_secs: u64,
    /// Delay before the first market summary (seconds).
    pub market_summary_first_delay_secs: u64,
    /// Opportunity check interval (seconds).
    pub opportunity_interval_secs: u64,
    /// Delay before the first opportunity check (seconds).
    pub opportunity_first_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            market_summary_interval_secs: 1800,
            market_summary_first_delay_secs: 5,
            opportunity_interval_secs: 300,
            opportunity_first_delay_secs: 30,
        }
    }
}

/// Recommendation generator bounds that are fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Trailing candles used for support/resistance.
    pub sr_window: usize,
    /// Minimum reference candles before levels are computed.
    pub min_reference_candles: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            sr_window: 50,
            min_reference_candles: 30,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Keep-alive server host address.
    pub host: String,
    /// Keep-alive server port.
    pub port: u16,
    pub telegram: TelegramConfig,
    pub market: MarketDataConfig,
    pub schedule: ScheduleConfig,
    pub recommendation: RecommendationConfig,
    /// Initial alert recipients.
    pub chat_ids: Vec<String>,
    /// Ignore commands from chats outside the recipient list.
    pub command_allow_list_only: bool,
    /// Initial runtime parameters.
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            telegram: TelegramConfig::default(),
            market: MarketDataConfig::default(),
            schedule: ScheduleConfig::default(),
            recommendation: RecommendationConfig::default(),
            chat_ids: Vec::new(),
            command_allow_list_only: false,
            settings: Settings::default(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, ignoring case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    let value = match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return default,
    };
    parse_flag(&value).unwrap_or_else(|| {
        tracing::warn!("Ignoring {}: '{}' is not a boolean", key, value);
        default
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let market_defaults = MarketDataConfig::default();
        let schedule_defaults = ScheduleConfig::default();
        let recommendation_defaults = RecommendationConfig::default();
        let telegram_defaults = TelegramConfig::default();

        // Format: "1m,5m,15m"
        let timeframes = env::var("TIMEFRAMES")
            .ok()
            .map(|s| {
                let mut tfs: Vec<Timeframe> = parse_list(&s)
                    .iter()
                    .filter_map(|tf| Timeframe::from_str(tf))
                    .collect();
                tfs.sort();
                tfs.dedup();
                tfs
            })
            .filter(|tfs| !tfs.is_empty())
            .unwrap_or(market_defaults.timeframes);

        let reference_timeframe = env::var("REFERENCE_TIMEFRAME")
            .ok()
            .and_then(|s| Timeframe::from_str(&s))
            .unwrap_or(market_defaults.reference_timeframe);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 10000),
            telegram: TelegramConfig {
                token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
                api_url: env::var("TELEGRAM_API_URL").unwrap_or(telegram_defaults.api_url),
                poll_timeout_secs: parse_env(
                    "TELEGRAM_POLL_TIMEOUT_SECS",
                    telegram_defaults.poll_timeout_secs,
                ),
            },
            market: MarketDataConfig {
                api_url: env::var("TWELVE_DATA_API_URL").unwrap_or(market_defaults.api_url),
                api_key: env::var("TWELVE_DATA_API_KEY").unwrap_or(market_defaults.api_key),
                symbol: env::var("SYMBOL").unwrap_or(market_defaults.symbol),
                timeframes,
                reference_timeframe,
                candle_lookback: parse_env("CANDLE_LOOKBACK", market_defaults.candle_lookback),
                daily_lookback: parse_env("DAILY_LOOKBACK", market_defaults.daily_lookback),
                http_timeout_secs: parse_env(
                    "HTTP_TIMEOUT_SECS",
                    market_defaults.http_timeout_secs,
                ),
            },
            schedule: ScheduleConfig {
                market_summary_interval_secs: parse_env(
                    "MARKET_SUMMARY_INTERVAL_SECS",
                    schedule_defaults.market_summary_interval_secs,
                ),
                market_summary_first_delay_secs: schedule_defaults.market_summary_first_delay_secs,
                opportunity_interval_secs: parse_env(
                    "OPPORTUNITY_INTERVAL_SECS",
                    schedule_defaults.opportunity_interval_secs,
                ),
                opportunity_first_delay_secs: schedule_defaults.opportunity_first_delay_secs,
            },
            recommendation: RecommendationConfig {
                sr_window: parse_env("SR_WINDOW", recommendation_defaults.sr_window),
                min_reference_candles: parse_env(
                    "MIN_REFERENCE_CANDLES",
                    recommendation_defaults.min_reference_candles,
                ),
            },
            chat_ids: env::var("CHAT_IDS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            command_allow_list_only: env_flag("COMMAND_ALLOW_LIST_ONLY", false),
            settings: Settings::from_env(),
        }
    }
}

/// How the recommendation generator treats targets beyond support/resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Clamp stop and target to support/resistance.
    Clamp,
    /// Downgrade to an advisory when the raw target is out of bounds
    /// or exceeds the average daily range.
    Strict,
}

impl TargetPolicy {
    pub const CHOICES: &'static [&'static str] = &["clamp", "strict"];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Some(Self::Clamp),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type accepted by a runtime parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Finite number within an inclusive range.
    Number { min: i64, max: i64 },
    /// Number, or "none" to unset.
    OptionalNumber,
    /// One of a fixed set of words.
    Choice(&'static [&'static str]),
}

impl ParamKind {
    fn usage(&self) -> String {
        match self {
            ParamKind::Number { min, max } => format!("a number between {} and {}", min, max),
            ParamKind::OptionalNumber => "a number, or 'none' to unset".to_string(),
            ParamKind::Choice(choices) => format!("one of: {}", choices.join(", ")),
        }
    }
}

/// Descriptor for a parameter settable through the `set` command.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
}

pub const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "rsi_high",
        kind: ParamKind::Number { min: 0, max: 100 },
        description: "overbought RSI level; BUY needs RSI below rsi_high - 5",
    },
    ParamSpec {
        name: "rsi_low",
        kind: ParamKind::Number { min: 0, max: 100 },
        description: "oversold RSI level; SELL needs RSI above rsi_low + 5",
    },
    ParamSpec {
        name: "resistance_threshold",
        kind: ParamKind::Number { min: 0, max: 1_000_000 },
        description: "watched resistance price",
    },
    ParamSpec {
        name: "manual_cfd_adjustment",
        kind: ParamKind::OptionalNumber,
        description: "offset added to the spot price",
    },
    ParamSpec {
        name: "alert_cooldown_minutes",
        kind: ParamKind::Number { min: 0, max: 1440 },
        description: "minutes before a same-direction alert may repeat",
    },
    ParamSpec {
        name: "alert_min_price_delta",
        kind: ParamKind::Number { min: 0, max: 1_000_000 },
        description: "price move required to repeat a same-direction alert",
    },
    ParamSpec {
        name: "tp_multiplier",
        kind: ParamKind::OptionalNumber,
        description: "take-profit ATR multiple; none = 1.5 or 2.0 by volatility",
    },
    ParamSpec {
        name: "target_policy",
        kind: ParamKind::Choice(TargetPolicy::CHOICES),
        description: "clamp targets to support/resistance, or strict = wait",
    },
];

/// Runtime parameters, adjustable through the `set` command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rsi_high: f64,
    pub rsi_low: f64,
    pub resistance_threshold: f64,
    pub manual_cfd_adjustment: Option<f64>,
    pub alert_cooldown_minutes: f64,
    pub alert_min_price_delta: f64,
    pub tp_multiplier: Option<f64>,
    pub target_policy: TargetPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rsi_high: 70.0,
            rsi_low: 30.0,
            resistance_threshold: 2000.0,
            manual_cfd_adjustment: None,
            alert_cooldown_minutes: 30.0,
            alert_min_price_delta: 0.0,
            tp_multiplier: None,
            target_policy: TargetPolicy::Clamp,
        }
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

impl Settings {
    /// Initial values from environment variables; invalid values keep defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        for spec in PARAMS {
            if let Ok(raw) = env::var(spec.name.to_uppercase()) {
                if let Err(e) = settings.set(spec.name, &raw) {
                    tracing::warn!("Ignoring {}: {}", spec.name.to_uppercase(), e);
                }
            }
        }
        settings
    }

    /// Look up a parameter descriptor by name (case-insensitive).
    pub fn param(name: &str) -> Option<&'static ParamSpec> {
        let name = name.trim().to_lowercase();
        PARAMS.iter().find(|p| p.name == name)
    }

    /// Current value of a parameter, formatted for display.
    pub fn get(&self, name: &str) -> Option<String> {
        let spec = Self::param(name)?;
        let value = match spec.name {
            "rsi_high" => self.rsi_high.to_string(),
            "rsi_low" => self.rsi_low.to_string(),
            "resistance_threshold" => self.resistance_threshold.to_string(),
            "manual_cfd_adjustment" => format_optional(self.manual_cfd_adjustment),
            "alert_cooldown_minutes" => self.alert_cooldown_minutes.to_string(),
            "alert_min_price_delta" => self.alert_min_price_delta.to_string(),
            "tp_multiplier" => format_optional(self.tp_multiplier),
            "target_policy" => self.target_policy.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// All parameters with their current values, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        PARAMS
            .iter()
            .filter_map(|p| self.get(p.name).map(|v| (p.name, v)))
            .collect()
    }

    /// Update a parameter from its textual value. Returns the new value
    /// formatted for display. State is unchanged on error.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<String> {
        let spec = Self::param(name).ok_or_else(|| AppError::UnknownParameter(name.to_string()))?;
        let raw = raw.trim();
        let invalid = || {
            AppError::InvalidArgument(format!(
                "{} expects {}, got '{}'",
                spec.name,
                spec.kind.usage(),
                raw
            ))
        };

        match spec.kind {
            ParamKind::Number { min, max } => {
                let value: f64 = raw.parse().map_err(|_| invalid())?;
                if !value.is_finite() || value < min as f64 || value > max as f64 {
                    return Err(invalid());
                }
                match spec.name {
                    "rsi_high" => self.rsi_high = value,
                    "rsi_low" => self.rsi_low = value,
                    "resistance_threshold" => self.resistance_threshold = value,
                    "alert_cooldown_minutes" => self.alert_cooldown_minutes = value,
                    "alert_min_price_delta" => self.alert_min_price_delta = value,
                    _ => return Err(AppError::UnknownParameter(name.to_string())),
                }
            }
            ParamKind::OptionalNumber => {
                let value = match raw.to_lowercase().as_str() {
                    "none" | "off" | "unset" => None,
                    _ => {
                        let v: f64 = raw.parse().map_err(|_| invalid())?;
                        if !v.is_finite() {
                            return Err(invalid());
                        }
                        Some(v)
                    }
                };
                match spec.name {
                    "manual_cfd_adjustment" => self.manual_cfd_adjustment = value,
                    "tp_multiplier" => {
                        if value.is_some_and(|v| v <= 0.0) {
                            return Err(invalid());
                        }
                        self.tp_multiplier = value;
                    }
                    _ => return Err(AppError::UnknownParameter(name.to_string())),
                }
            }
            ParamKind::Choice(_) => match spec.name {
                "target_policy" => {
                    self.target_policy = TargetPolicy::from_str(raw).ok_or_else(invalid)?;
                }
                _ => return Err(AppError::UnknownParameter(name.to_string())),
            },
        }

        self.get(spec.name)
            .ok_or_else(|| AppError::UnknownParameter(name.to_string()))
    }

    /// RSI must be below this for a BUY label.
    pub fn buy_rsi_ceiling(&self) -> f64 {
        self.rsi_high - 5.0
    }

    /// RSI must be above this for a SELL label.
    pub fn sell_rsi_floor(&self) -> f64 {
        self.rsi_low + 5.0
    }

    pub fn alert_cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.alert_cooldown_minutes * 60_000.0) as i64)
    }

    /// Spot price with the manual CFD adjustment applied.
    pub fn adjust_price(&self, spot: f64) -> f64 {
        spot + self.manual_cfd_adjustment.unwrap_or(0.0)
    }
}
