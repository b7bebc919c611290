//! Published display state of the alert poller.

use chrono::{DateTime, Utc};
use ffpinvest_core::{is_open_alert_visible, AlertKind, CloseTradeAlert, OpenTradeAlert};
use std::sync::Arc;
use tokio::time::Instant;

/// Outcome of the most recent poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PollStatus {
    /// No cycle has completed yet, or a manual retry is running.
    #[default]
    Loading,
    Ready,
    /// Last cycle failed; the user may retry.
    Failed { message: String },
}

impl PollStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, PollStatus::Failed { .. })
    }
}

/// Everything a screen needs to render the alert dashboard.
///
/// Snapshots are shared behind `Arc` and replaced wholesale on every
/// successful poll.
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    pub open: Option<Arc<OpenTradeAlert>>,
    pub close: Option<Arc<CloseTradeAlert>>,
    /// Whether the open alert is still inside its visibility window.
    pub open_visible: bool,
    /// Dismissal deadline of the open-alert popup.
    pub open_popup_until: Option<Instant>,
    /// Dismissal deadline of the close-alert popup.
    pub close_popup_until: Option<Instant>,
    pub status: PollStatus,
    pub successful_polls: u64,
    pub failed_polls: u64,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl AlertBoard {
    /// The open-alert card is shown only while visible.
    pub fn shows_open_card(&self) -> bool {
        self.open.is_some() && self.open_visible
    }

    pub fn shows_close_card(&self) -> bool {
        self.close.is_some()
    }

    pub fn popup_active(&self, kind: AlertKind, now: Instant) -> bool {
        let deadline = match kind {
            AlertKind::Open => self.open_popup_until,
            AlertKind::Close => self.close_popup_until,
        };
        deadline.is_some_and(|d| now < d)
    }

    pub(crate) fn show_popup(&mut self, kind: AlertKind, until: Instant) {
        match kind {
            AlertKind::Open => self.open_popup_until = Some(until),
            AlertKind::Close => self.close_popup_until = Some(until),
        }
    }

    /// Recompute visibility and drop expired popups. Returns true if anything
    /// changed.
    pub(crate) fn refresh(&mut self, wall_now: DateTime<Utc>, now: Instant) -> bool {
        let visible = match &self.open {
            Some(open) => is_open_alert_visible(&open.timestamp, wall_now),
            None => true,
        };
        let mut changed = visible != self.open_visible;
        self.open_visible = visible;

        for popup in [&mut self.open_popup_until, &mut self.close_popup_until] {
            if popup.is_some_and(|d| now >= d) {
                *popup = None;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ffpinvest_core::AlertRecord;
    use serde_json::json;
    use std::time::Duration;

    fn open_at(timestamp: &str) -> Arc<OpenTradeAlert> {
        Arc::new(
            OpenTradeAlert::from_data(&json!({
                "pair": "EUR/USD",
                "direction": "long",
                "entry": "1.0800",
                "timestamp": timestamp,
                "type": "open"
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_default_board() {
        let board = AlertBoard::default();
        assert_eq!(board.status, PollStatus::Loading);
        assert!(!board.shows_open_card());
        assert!(!board.shows_close_card());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_hides_stale_open_alert() {
        let mut board = AlertBoard {
            open: Some(open_at("2025-02-25T10:00:00")),
            ..Default::default()
        };
        let now = Instant::now();

        let fresh = Utc.with_ymd_and_hms(2025, 2, 25, 10, 3, 0).unwrap();
        assert!(board.refresh(fresh, now));
        assert!(board.shows_open_card());
        assert!(!board.refresh(fresh, now));

        let stale = Utc.with_ymd_and_hms(2025, 2, 25, 10, 6, 0).unwrap();
        assert!(board.refresh(stale, now));
        assert!(!board.shows_open_card());
        assert!(board.open.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_popup_expiry() {
        let mut board = AlertBoard::default();
        let now = Instant::now();
        board.show_popup(AlertKind::Close, now + Duration::from_secs(10));

        assert!(board.popup_active(AlertKind::Close, now));
        assert!(!board.popup_active(AlertKind::Open, now));

        let wall = Utc::now();
        board.refresh(wall, now + Duration::from_secs(9));
        assert!(board.close_popup_until.is_some());

        assert!(board.refresh(wall, now + Duration::from_secs(10)));
        assert!(board.close_popup_until.is_none());
        assert!(!board.popup_active(AlertKind::Close, now + Duration::from_secs(10)));
    }
}
