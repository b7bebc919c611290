//! Trade alert records published by the FFPInvest alert service.

use crate::time::parse_service_timestamp;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Record category, carried on the wire as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Open,
    Close,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Open => "open",
            AlertKind::Close => "close",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade direction of an open alert.
///
/// The service has sent both `long`/`short` and `buy`/`sell`; unknown
/// values are preserved rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Long,
    Short,
    Other(CompactString),
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Other(CompactString::default())
    }
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Direction::Long,
            "short" | "sell" => Direction::Short,
            _ => Direction::Other(CompactString::new(raw.trim())),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
            Direction::Other(raw) => raw.as_str(),
        }
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        matches!(self, Direction::Long)
    }

    /// Human label used in notifications ("Long"/"Short").
    pub fn label(&self) -> &str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
            Direction::Other(raw) => raw.as_str(),
        }
    }
}

/// Currently recommended trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTradeAlert {
    /// Currency pair code (e.g., "EUR/USD")
    #[serde(default, deserialize_with = "lenient_text")]
    pub pair: CompactString,
    #[serde(default, deserialize_with = "lenient_text")]
    pub direction: Direction,
    /// Entry price as sent by the service (decimal string)
    #[serde(default, deserialize_with = "lenient_text")]
    pub entry: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stop_loss: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub stop_loss_percent: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub take_profit: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub take_profit_percent: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub take_profit_goal: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub disclaimer: String,
    /// Naive service time, interpreted as UTC
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: String,
    #[serde(rename = "type", default = "open_kind")]
    pub kind: AlertKind,
}

/// Most recent trade closure notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTradeAlert {
    #[serde(default, deserialize_with = "lenient_text")]
    pub pair: CompactString,
    #[serde(default, deserialize_with = "lenient_text")]
    pub closing_price: String,
    /// Closing date, naive service time
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub disclaimer: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: String,
    #[serde(rename = "type", default = "close_kind")]
    pub kind: AlertKind,
}

fn open_kind() -> AlertKind {
    AlertKind::Open
}

fn close_kind() -> AlertKind {
    AlertKind::Close
}

/// Title and body of a user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Common behaviour of the two alert record types.
pub trait AlertRecord: DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static {
    /// Category this record type belongs to.
    const KIND: AlertKind;

    fn kind(&self) -> AlertKind;

    fn pair(&self) -> &str;

    fn timestamp(&self) -> &str;

    /// Field-by-field equality. Independent of JSON key order.
    fn same_fields(&self, other: &Self) -> bool;

    /// Notification summary for this record.
    fn notice(&self) -> Notice;

    /// Decode the `data` field of a service response.
    ///
    /// `null`, an empty object, a non-object, a record that fails to decode
    /// and a record tagged with the other category all mean "no current alert".
    fn from_data(data: &Value) -> Option<Self> {
        let object = data.as_object()?;
        if object.is_empty() {
            return None;
        }
        let record: Self = serde_json::from_value(data.clone()).ok()?;
        (record.kind() == Self::KIND).then_some(record)
    }

    /// Service timestamp as UTC, if it parses.
    fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        parse_service_timestamp(self.timestamp())
    }
}

impl AlertRecord for OpenTradeAlert {
    const KIND: AlertKind = AlertKind::Open;

    fn kind(&self) -> AlertKind {
        self.kind
    }

    fn pair(&self) -> &str {
        self.pair.as_str()
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.pair == other.pair
            && self.direction == other.direction
            && self.entry == other.entry
            && self.stop_loss == other.stop_loss
            && self.stop_loss_percent == other.stop_loss_percent
            && self.take_profit == other.take_profit
            && self.take_profit_percent == other.take_profit_percent
            && self.take_profit_goal == other.take_profit_goal
            && self.disclaimer == other.disclaimer
            && self.timestamp == other.timestamp
            && self.kind == other.kind
    }

    fn notice(&self) -> Notice {
        Notice {
            title: "New Trade Alert".to_string(),
            body: format!("{} {} @ {}", self.pair, self.direction.label(), self.entry),
        }
    }
}

impl AlertRecord for CloseTradeAlert {
    const KIND: AlertKind = AlertKind::Close;

    fn kind(&self) -> AlertKind {
        self.kind
    }

    fn pair(&self) -> &str {
        self.pair.as_str()
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.pair == other.pair
            && self.closing_price == other.closing_price
            && self.date == other.date
            && self.disclaimer == other.disclaimer
            && self.timestamp == other.timestamp
            && self.kind == other.kind
    }

    fn notice(&self) -> Notice {
        Notice {
            title: "Trade Closed".to_string(),
            body: format!("{} closed at {}", self.pair, self.closing_price),
        }
    }
}

impl PartialEq for OpenTradeAlert {
    fn eq(&self, other: &Self) -> bool {
        self.same_fields(other)
    }
}

impl PartialEq for CloseTradeAlert {
    fn eq(&self, other: &Self) -> bool {
        self.same_fields(other)
    }
}

/// Accepts strings, numbers and null for text fields.
fn lenient_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Value::deserialize(deserializer)?;
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    };
    Ok(T::from(text))
}

/// Accepts numbers and numeric strings; anything else reads as 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
