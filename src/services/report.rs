//! Chat message formatting.

use super::market::Analysis;
use crate::config::{Settings, PARAMS};
use crate::types::{AggregateCall, SignalReport, TimeframeLabel, TimeframeSignal};

pub const OPPORTUNITY_BANNER: &str = "🚨 OPPORTUNITY DETECTED 🚨";

pub const HELP_TEXT: &str = "\
Commands:
/price (/p) - current price, signals and recommendation
/opportunity (/o) - run the opportunity check now
/addid <chat id> - add an alert recipient
/listids - list alert recipients
/config (/c) - show runtime parameters
/set (/s) <param> <value> - change a runtime parameter
/setprice <broker price> - calibrate the CFD adjustment
/help (/h) - this message";

fn format_rsi(rsi: Option<f64>) -> String {
    rsi.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
}

/// "📊 Current XAU/USD price: 2345.67 USD"
pub fn price_line(symbol: &str, price: Option<f64>) -> String {
    match price {
        Some(price) => format!("📊 Current {} price: {:.2} USD", symbol, price),
        None => format!("📊 Current {} price: unavailable", symbol),
    }
}

pub fn call_line(call: AggregateCall) -> &'static str {
    match call {
        AggregateCall::Buy => "🚀 BUY signal confirmed",
        AggregateCall::Sell => "🔻 SELL signal confirmed",
        AggregateCall::Indecisive => "🤔 Indecisive signal",
    }
}

pub fn timeframe_line(signal: &TimeframeSignal) -> String {
    let detail = match signal.label {
        TimeframeLabel::Buy => format!("✅ possible BUY (EMA20>EMA50, RSI={})", format_rsi(signal.rsi)),
        TimeframeLabel::Sell => {
            format!("❌ possible SELL (EMA20<EMA50, RSI={})", format_rsi(signal.rsi))
        }
        TimeframeLabel::Neutral => format!("🤔 no clear signal (RSI={})", format_rsi(signal.rsi)),
        TimeframeLabel::NoData => "⚠️ No data available".to_string(),
    };
    format!("{}: {}", signal.timeframe, detail)
}

/// Aggregate call followed by one line per timeframe.
pub fn signal_block(report: &SignalReport) -> String {
    let mut lines = vec![call_line(report.call).to_string()];
    lines.extend(report.timeframes.iter().map(timeframe_line));
    lines.join("\n")
}

/// Where the price sits relative to the watched resistance level.
fn resistance_line(price: Option<f64>, settings: &Settings) -> Option<String> {
    let price = price?;
    let side = if price >= settings.resistance_threshold {
        "above"
    } else {
        "below"
    };
    Some(format!(
        "📏 Price is {} the watched resistance ({:.2})",
        side, settings.resistance_threshold
    ))
}

/// Price, signals and recommendation, as sent by the scheduled summary
/// and the `price` command.
pub fn market_summary(symbol: &str, analysis: &Analysis, settings: &Settings) -> String {
    let mut sections = vec![price_line(symbol, analysis.price)];
    if let Some(line) = resistance_line(analysis.price, settings) {
        sections.push(line);
    }
    sections.push(signal_block(&analysis.signals));
    sections.push(analysis.recommendation.to_string());
    sections.join("\n\n")
}

/// Reply to the `opportunity` command.
pub fn opportunity_report(symbol: &str, analysis: &Analysis) -> String {
    [
        "🔎 Opportunity check".to_string(),
        price_line(symbol, analysis.price),
        signal_block(&analysis.signals),
        analysis.recommendation.to_string(),
    ]
    .join("\n\n")
}

/// Unsolicited alert emitted by the opportunity job.
pub fn opportunity_alert(symbol: &str, analysis: &Analysis) -> String {
    format!(
        "{}\n{}\n\n{}\n\n{}",
        OPPORTUNITY_BANNER,
        price_line(symbol, analysis.price),
        call_line(analysis.signals.call),
        analysis.recommendation
    )
}

/// Runtime parameters with current values and descriptions.
pub fn settings_listing(settings: &Settings) -> String {
    let mut lines = vec!["⚙️ Current configuration:".to_string()];
    for (spec, (name, value)) in PARAMS.iter().zip(settings.entries()) {
        lines.push(format!("{} = {} ({})", name, value, spec.description));
    }
    lines.join("\n")
}

pub fn recipients_listing(recipients: &[String]) -> String {
    if recipients.is_empty() {
        return "📋 No registered recipients.".to_string();
    }
    let mut lines = vec!["📋 Registered recipients:".to_string()];
    lines.extend(recipients.iter().map(|id| format!("- {}", id)));
    lines.join("\n")
}
