//! Terminal stand-ins for the device capabilities, and the board renderer.

use async_trait::async_trait;
use ffpinvest_alerts::{
    AlertBoard, LocalNotifier, PollStatus, SideEffectError, SoundPlayer, Vibrator,
};
use ffpinvest_core::{close_alert_rows, open_alert_rows, AlertKind, CardRow};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Rings the terminal bell as the alert chime.
#[derive(Default)]
pub struct TerminalBell {
    muted: bool,
    released: AtomicBool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self {
            muted: !enabled,
            released: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SoundPlayer for TerminalBell {
    async fn play_short_sound(&self) -> Result<(), SideEffectError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(SideEffectError::Sound("bell released".to_string()));
        }
        if self.muted {
            debug!("Bell muted");
            return Ok(());
        }
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| SideEffectError::Sound(e.to_string()))
    }

    async fn reload(&self) -> Result<(), SideEffectError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(SideEffectError::Sound("bell released".to_string()));
        }
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// A terminal cannot vibrate; the pattern is logged instead.
pub struct LogVibrator;

#[async_trait]
impl Vibrator for LogVibrator {
    async fn vibrate(&self, pattern: &[u64]) -> Result<(), SideEffectError> {
        debug!(?pattern, "Vibrate");
        Ok(())
    }
}

/// Prints notifications to the log.
pub struct ConsoleNotifier;

#[async_trait]
impl LocalNotifier for ConsoleNotifier {
    async fn show_local_notification(
        &self,
        title: &str,
        body: &str,
    ) -> Result<(), SideEffectError> {
        info!("🔔 {}: {}", title, body);
        Ok(())
    }
}

/// Delivers each notification to every inner notifier.
///
/// Fails if any delivery failed, after trying all of them.
pub struct NotifierChain {
    notifiers: Vec<Arc<dyn LocalNotifier>>,
}

impl NotifierChain {
    pub fn new(notifiers: Vec<Arc<dyn LocalNotifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl LocalNotifier for NotifierChain {
    async fn show_local_notification(
        &self,
        title: &str,
        body: &str,
    ) -> Result<(), SideEffectError> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.show_local_notification(title, body).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn push_card(out: &mut String, heading: &str, rows: &[CardRow]) {
    out.push_str(heading);
    out.push('\n');
    for row in rows {
        if row.is_disclaimer {
            out.push_str(&format!("  {}\n", row.value));
        } else {
            out.push_str(&format!("  {:<17}{}\n", row.label, row.value));
        }
    }
}

/// Render the board as plain text.
pub fn render_board(board: &AlertBoard, now: Instant) -> String {
    let mut out = String::new();

    match &board.status {
        PollStatus::Loading => out.push_str("⏳ Loading...\n"),
        PollStatus::Failed { message } => {
            out.push_str(&format!("❌ {}  (press r + Enter to retry)\n", message))
        }
        PollStatus::Ready => {}
    }

    if board.popup_active(AlertKind::Open, now) {
        out.push_str("📣 New Trade Alert!\n");
    }
    if board.popup_active(AlertKind::Close, now) {
        out.push_str("📣 Trade Closed!\n");
    }

    match &board.open {
        Some(open) if board.shows_open_card() => {
            push_card(&mut out, "── Open Trade ──", &open_alert_rows(open))
        }
        _ => out.push_str("No open trade alerts at this time.\n"),
    }

    match &board.close {
        Some(close) => push_card(&mut out, "── Closed Trade ──", &close_alert_rows(close)),
        None => out.push_str("No closed trade alerts at this time.\n"),
    }

    out
}
