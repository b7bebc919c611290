//! Display formatting for alert cards.

use crate::alert::{CloseTradeAlert, Direction, OpenTradeAlert};
use crate::time::parse_service_timestamp;
use chrono::Local;

/// Flag emoji per ISO currency code.
const CURRENCY_FLAGS: [(&str, &str); 16] = [
    ("USD", "🇺🇸"),
    ("EUR", "🇪🇺"),
    ("GBP", "🇬🇧"),
    ("JPY", "🇯🇵"),
    ("AUD", "🇦🇺"),
    ("CAD", "🇨🇦"),
    ("CHF", "🇨🇭"),
    ("CNY", "🇨🇳"),
    ("NZD", "🇳🇿"),
    ("SEK", "🇸🇪"),
    ("NOK", "🇳🇴"),
    ("DKK", "🇩🇰"),
    ("ZAR", "🇿🇦"),
    ("INR", "🇮🇳"),
    ("BRL", "🇧🇷"),
    ("RUB", "🇷🇺"),
];

pub fn currency_flag(code: &str) -> Option<&'static str> {
    CURRENCY_FLAGS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, flag)| *flag)
}

/// Prefix a pair with the flags of its two currencies ("🇪🇺🇺🇸 EUR/USD").
///
/// Pairs without a `/` are returned as-is.
pub fn pair_with_flags(pair: &str) -> String {
    let Some((base, quote)) = pair.split_once('/') else {
        return pair.to_string();
    };
    format!(
        "{}{} {}",
        currency_flag(base).unwrap_or(""),
        currency_flag(quote).unwrap_or(""),
        pair
    )
}

/// Render a service timestamp in the local timezone.
pub fn local_time(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "N/A".to_string();
    }
    match parse_service_timestamp(raw) {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Invalid Time".to_string(),
    }
}

pub fn direction_badge(direction: &Direction) -> &'static str {
    if direction.is_long() {
        "🐂 Long"
    } else {
        "🐻 Short"
    }
}

/// One labelled line of an alert card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub label: &'static str,
    pub value: String,
    pub is_disclaimer: bool,
}

impl CardRow {
    fn new(label: &'static str, value: String) -> Self {
        Self {
            label,
            value,
            is_disclaimer: false,
        }
    }

    fn disclaimer(value: &str) -> Self {
        Self {
            label: "Disclaimer",
            value: format!("🚨 {}", value),
            is_disclaimer: true,
        }
    }
}

pub fn open_alert_rows(alert: &OpenTradeAlert) -> Vec<CardRow> {
    vec![
        CardRow::new("Timestamp", format!("⏰ {}", local_time(&alert.timestamp))),
        CardRow::new("Pair", pair_with_flags(&alert.pair)),
        CardRow::new("Direction", direction_badge(&alert.direction).to_string()),
        CardRow::new("Entry", format!("🔑 {}", alert.entry)),
        CardRow::new(
            "Stop Loss",
            format!("🛑 {} ({}%)", alert.stop_loss, alert.stop_loss_percent),
        ),
        CardRow::new(
            "Take Profit",
            format!("🤑 {} ({}%)", alert.take_profit, alert.take_profit_percent),
        ),
        CardRow::new("Take Profit Goal", alert.take_profit_goal.clone()),
        CardRow::disclaimer(&alert.disclaimer),
    ]
}

pub fn close_alert_rows(alert: &CloseTradeAlert) -> Vec<CardRow> {
    vec![
        CardRow::new("Timestamp", format!("⏰ {}", local_time(&alert.timestamp))),
        CardRow::new("Pair", pair_with_flags(&alert.pair)),
        CardRow::new("Closing Price", format!("💵 {}", alert.closing_price)),
        CardRow::new("Date", format!("📅 {}", local_time(&alert.date))),
        CardRow::disclaimer(&alert.disclaimer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pair_with_flags() {
        assert_eq!(pair_with_flags("EUR/USD"), "🇪🇺🇺🇸 EUR/USD");
        assert_eq!(pair_with_flags("XAU/USD"), "🇺🇸 XAU/USD");
        assert_eq!(pair_with_flags("EURUSD"), "EURUSD");
        assert_eq!(pair_with_flags(""), "");
    }

    #[test]
    fn test_local_time_fallbacks() {
        assert_eq!(local_time(""), "N/A");
        assert_eq!(local_time("not a time"), "Invalid Time");
        let rendered = local_time("2025-02-25T10:00:00");
        assert!(rendered.starts_with("2025-02-2"));
    }

    #[test]
    fn test_open_rows() {
        let alert = OpenTradeAlert::from_data(&json!({
            "pair": "EUR/USD",
            "direction": "buy",
            "entry": "1.0800",
            "stopLoss": "1.0750",
            "stopLossPercent": 0.5,
            "takeProfit": "1.0900",
            "takeProfitPercent": 1,
            "takeProfitGoal": "Range top",
            "disclaimer": "Trade at your own risk",
            "type": "open"
        }))
        .unwrap();

        let rows = open_alert_rows(&alert);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].value, "⏰ N/A");
        assert_eq!(rows[2].value, "🐂 Long");
        assert_eq!(rows[3].value, "🔑 1.0800");
        assert_eq!(rows[4].value, "🛑 1.0750 (0.5%)");
        assert_eq!(rows[5].value, "🤑 1.0900 (1%)");
        assert!(rows[7].is_disclaimer);
        assert_eq!(rows[7].value, "🚨 Trade at your own risk");
    }

    #[test]
    fn test_close_rows() {
        let alert = CloseTradeAlert::from_data(&json!({
            "pair": "GBP/JPY",
            "closingPrice": "191.20",
            "date": "garbage",
            "type": "close"
        }))
        .unwrap();

        let rows = close_alert_rows(&alert);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].value, "🇬🇧🇯🇵 GBP/JPY");
        assert_eq!(rows[2].value, "💵 191.20");
        assert_eq!(rows[3].value, "📅 Invalid Time");
    }

    #[test]
    fn test_short_badge() {
        assert_eq!(direction_badge(&Direction::Short), "🐻 Short");
        assert_eq!(direction_badge(&Direction::default()), "🐻 Short");
    }
}
