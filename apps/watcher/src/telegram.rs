//! Telegram relay for alert notifications.
//!
//! Enabled when TELEGRAM_ALERT_BOT_TOKEN and TELEGRAM_ALERT_CHAT_ID are set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ffpinvest_alerts::{LocalNotifier, SideEffectError};
use tracing::{info, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API host, without trailing slash.
    pub api_base: String,
}

impl TelegramConfig {
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_ALERT_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_ALERT_CHAT_ID").ok()?;

        if bot_token.is_empty() || chat_id.is_empty() {
            return None;
        }

        Some(Self {
            bot_token,
            chat_id,
            api_base: TELEGRAM_API.to_string(),
        })
    }

    /// First characters of the chat id, safe to log.
    pub fn chat_id_hint(&self) -> String {
        self.chat_id.chars().take(6).collect()
    }
}

/// Minimal HTML escaping for Telegram's HTML parse mode.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build the message body sent to the chat.
pub fn format_message(hostname: &str, title: &str, body: &str, now: DateTime<Utc>) -> String {
    format!(
        "<b>{}</b>\n📈 <b>{}</b>\n{}\n\n⏰ {}",
        escape_html(hostname),
        escape_html(title),
        escape_html(body),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    http_client: reqwest::Client,
    hostname: String,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            config,
            http_client: reqwest::Client::new(),
            hostname,
        }
    }

    /// Build a notifier from the environment, if configured.
    pub fn try_from_env() -> Option<Self> {
        match TelegramConfig::from_env() {
            Some(config) => {
                info!("Telegram relay enabled (chat_id: {})", config.chat_id_hint());
                Some(Self::new(config))
            }
            None => {
                info!("Telegram relay disabled (TELEGRAM_ALERT_BOT_TOKEN or TELEGRAM_ALERT_CHAT_ID not set)");
                None
            }
        }
    }

    async fn send_telegram_message(&self, message: &str) -> Result<(), SideEffectError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        );

        let params = [
            ("chat_id", self.config.chat_id.as_str()),
            ("text", message),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];

        let response = self
            .http_client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SideEffectError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Telegram API returned non-success status: {}", status);
            return Err(SideEffectError::Notification(format!(
                "Telegram API returned {}",
                status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl LocalNotifier for TelegramNotifier {
    async fn show_local_notification(
        &self,
        title: &str,
        body: &str,
    ) -> Result<(), SideEffectError> {
        let message = format_message(&self.hostname, title, body, Utc::now());
        self.send_telegram_message(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    async fn serve(status: StatusCode) -> String {
        let router =
            Router::new().route("/botTOKEN/sendMessage", post(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn notifier(api_base: String) -> TelegramNotifier {
        TelegramNotifier::new(TelegramConfig {
            bot_token: "TOKEN".to_string(),
            chat_id: "12345".to_string(),
            api_base,
        })
    }

    #[tokio::test]
    async fn test_rejected_message_is_an_error() {
        let relay = notifier(serve(StatusCode::FORBIDDEN).await);
        let err = relay
            .show_local_notification("Trade Closed", "EUR/USD closed at 1.0850")
            .await
            .unwrap_err();
        assert!(matches!(err, SideEffectError::Notification(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_accepted_message_is_ok() {
        let relay = notifier(serve(StatusCode::OK).await);
        assert!(relay
            .show_local_notification("Trade Closed", "EUR/USD closed at 1.0850")
            .await
            .is_ok());
    }

    #[test]
    fn test_chat_id_hint_respects_char_boundaries() {
        let config = TelegramConfig {
            bot_token: "t".to_string(),
            chat_id: "ñññññññ-chat".to_string(),
            api_base: TELEGRAM_API.to_string(),
        };
        assert_eq!(config.chat_id_hint(), "ññññññ");
    }

    #[test]
    fn test_format_message() {
        let now = Utc.with_ymd_and_hms(2025, 2, 25, 10, 0, 0).unwrap();
        let text = format_message("box-1", "New Trade Alert", "EUR/USD Long @ 1.0800", now);
        assert_eq!(
            text,
            "<b>box-1</b>\n📈 <b>New Trade Alert</b>\nEUR/USD Long @ 1.0800\n\n⏰ 2025-02-25 10:00:00 UTC"
        );
    }

    #[test]
    fn test_format_message_escapes_html() {
        let now = Utc.with_ymd_and_hms(2025, 2, 25, 10, 0, 0).unwrap();
        let text = format_message("h", "Trade Closed", "A<B & C>D", now);
        assert!(text.contains("A&lt;B &amp; C&gt;D"));
    }
}
