//! Trade alert poller.
//!
//! Polls the alert source on a fixed interval, classifies how each alert
//! category moved since the previous successful poll, publishes an
//! [`AlertBoard`], and then fires device effects for genuine changes in the
//! background.

use crate::board::{AlertBoard, PollStatus};
use crate::device::{DeviceEffects, EffectReport};
use crate::preference::NotificationPreference;
use crate::task::{spawn_interval, TaskHandle};
use chrono::{DateTime, Utc};
use ffpinvest_core::{classify, AlertKind, AlertRecord, Notice, Transition};
use ffpinvest_feeds::{AlertSnapshot, AlertSource, FetchError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Source of wall-clock time for the visibility rule.
pub type WallClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Timing configuration for the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Milliseconds between open-alert visibility checks.
    pub visibility_interval_ms: u64,
    /// Seconds a change popup stays on screen.
    pub popup_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            visibility_interval_ms: 1000,
            popup_secs: 10,
        }
    }
}

impl PollerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Never slower than once per second.
    pub fn visibility_interval(&self) -> Duration {
        Duration::from_millis(self.visibility_interval_ms.clamp(10, 1000))
    }

    /// At least one second, so a popup is always seen.
    pub fn popup_duration(&self) -> Duration {
        Duration::from_secs(self.popup_secs.max(1))
    }
}

/// What one call to [`AlertPoller::poll_once`] did.
#[derive(Debug)]
pub enum PollOutcome {
    /// The board was updated. Device effects for notifying transitions run
    /// on `effects` after the update is published.
    Applied {
        report: CycleReport,
        effects: Option<JoinHandle<FiredEffects>>,
    },
    Failed(FetchError),
    /// The poller was shut down; the response (if any) was dropped.
    Discarded,
}

impl PollOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            PollOutcome::Applied { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Wait for the device effects this cycle dispatched.
    pub async fn effects(self) -> FiredEffects {
        match self {
            PollOutcome::Applied {
                effects: Some(task),
                ..
            } => task.await.unwrap_or_default(),
            _ => FiredEffects::default(),
        }
    }
}

/// Per-category transitions of an applied poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub open: Transition,
    pub close: Transition,
}

impl CycleReport {
    /// Number of popups raised this cycle.
    pub fn popups(&self) -> usize {
        usize::from(self.open.notifies()) + usize::from(self.close.notifies())
    }
}

/// Device effects fired for one cycle. `None` means no batch went out for
/// that category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredEffects {
    pub open: Option<EffectReport>,
    pub close: Option<EffectReport>,
}

impl FiredEffects {
    /// Number of side-effect batches fired.
    pub fn batches(&self) -> usize {
        usize::from(self.open.is_some()) + usize::from(self.close.is_some())
    }
}

struct Inner {
    source: Arc<dyn AlertSource>,
    effects: DeviceEffects,
    preference: NotificationPreference,
    config: PollerConfig,
    clock: WallClock,
    board: watch::Sender<AlertBoard>,
    /// Serializes poll cycles; a manual retry never overlaps a scheduled poll.
    cycle: tokio::sync::Mutex<()>,
    shut_down: AtomicBool,
}

/// Alert poller. Owns its timers; dropping it tears everything down.
pub struct AlertPoller {
    inner: Arc<Inner>,
    tasks: Mutex<Vec<TaskHandle>>,
}

impl AlertPoller {
    pub fn new(
        source: Arc<dyn AlertSource>,
        effects: DeviceEffects,
        preference: NotificationPreference,
        config: PollerConfig,
    ) -> Self {
        Self::with_clock(source, effects, preference, config, Arc::new(Utc::now))
    }

    pub fn with_clock(
        source: Arc<dyn AlertSource>,
        effects: DeviceEffects,
        preference: NotificationPreference,
        config: PollerConfig,
        clock: WallClock,
    ) -> Self {
        let (board, _) = watch::channel(AlertBoard::default());
        Self {
            inner: Arc::new(Inner {
                source,
                effects,
                preference,
                config,
                clock,
                board,
                cycle: tokio::sync::Mutex::new(()),
                shut_down: AtomicBool::new(false),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Current board.
    pub fn board(&self) -> AlertBoard {
        self.inner.board.borrow().clone()
    }

    /// Watch the board for updates.
    pub fn subscribe(&self) -> watch::Receiver<AlertBoard> {
        self.inner.board.subscribe()
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Start the poll loop and the visibility ticker. Calling twice is a no-op.
    pub fn start(&self) {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            warn!("Alert poller already shut down; not starting");
            return;
        }
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        if !tasks.is_empty() {
            debug!("Alert poller already running");
            return;
        }

        let poll_inner = self.inner.clone();
        tasks.push(spawn_interval(
            "alert-poll",
            self.inner.config.poll_interval(),
            move || {
                let inner = poll_inner.clone();
                async move {
                    inner.poll_once().await;
                }
            },
        ));

        let visibility_inner = self.inner.clone();
        tasks.push(spawn_interval(
            "alert-visibility",
            self.inner.config.visibility_interval(),
            move || {
                let inner = visibility_inner.clone();
                async move {
                    inner.refresh_visibility();
                }
            },
        ));

        info!(
            poll_secs = self.inner.config.poll_interval_secs,
            "Alert poller started"
        );
    }

    /// Run one poll cycle now.
    pub async fn poll_once(&self) -> PollOutcome {
        self.inner.poll_once().await
    }

    /// Manual retry after a failed cycle. The status shows `Loading` until
    /// the cycle completes.
    pub async fn retry(&self) -> PollOutcome {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return PollOutcome::Discarded;
        }
        info!("Manual retry requested");
        self.inner
            .board
            .send_modify(|board| board.status = PollStatus::Loading);
        self.inner.poll_once().await
    }

    /// Recompute open-alert visibility and expire popups now.
    pub fn refresh_visibility(&self) {
        self.inner.refresh_visibility();
    }

    /// Cancel both timers and release the audio resource.
    ///
    /// Synchronous and idempotent. Responses still in flight are discarded.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.cancel();
            }
        }
        self.inner.effects.release();
        info!("Alert poller stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Whether the timers are running.
    pub fn is_running(&self) -> bool {
        self.tasks.lock().map(|t| !t.is_empty()).unwrap_or(false)
    }
}

impl Drop for AlertPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    async fn poll_once(self: &Arc<Self>) -> PollOutcome {
        if self.is_shut_down() {
            return PollOutcome::Discarded;
        }
        let _cycle = self.cycle.lock().await;

        let result = self.source.fetch_alerts().await;
        if self.is_shut_down() {
            debug!("Discarding alert response received after shutdown");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => self.apply(snapshot),
            Err(e) => {
                if e.is_transient() {
                    warn!(error = %e, "Alert poll failed");
                } else {
                    error!(error = %e, "Alert poll failed");
                }
                let message = e.user_message();
                self.board.send_modify(|board| {
                    board.status = PollStatus::Failed { message };
                    board.failed_polls += 1;
                });
                PollOutcome::Failed(e)
            }
        }
    }

    /// Publish the snapshot, then hand device effects to a background task so
    /// a slow capability never holds the cycle.
    fn apply(self: &Arc<Self>, snapshot: AlertSnapshot) -> PollOutcome {
        let AlertSnapshot { open, close } = snapshot;
        let (has_baseline, prev_open, prev_close) = {
            let board = self.board.borrow();
            (
                board.successful_polls > 0,
                board.open.clone(),
                board.close.clone(),
            )
        };

        let open_transition = classify(has_baseline, prev_open.as_deref(), open.as_ref());
        let close_transition = classify(has_baseline, prev_close.as_deref(), close.as_ref());
        let open_notice = announce(open_transition, open.as_ref());
        let close_notice = announce(close_transition, close.as_ref());

        let wall_now = (self.clock)();
        let now = Instant::now();
        let popup_until = now + self.config.popup_duration();
        let open = open.map(Arc::new);
        let close = close.map(Arc::new);

        self.board.send_modify(|board| {
            board.open = open;
            board.close = close;
            if open_transition.notifies() {
                board.show_popup(AlertKind::Open, popup_until);
            }
            if close_transition.notifies() {
                board.show_popup(AlertKind::Close, popup_until);
            }
            board.refresh(wall_now, now);
            board.status = PollStatus::Ready;
            board.successful_polls += 1;
            board.last_success_at = Some(wall_now);
        });

        let effects = (open_notice.is_some() || close_notice.is_some()).then(|| {
            let inner = self.clone();
            tokio::spawn(async move { inner.fire_effects(open_notice, close_notice).await })
        });

        PollOutcome::Applied {
            report: CycleReport {
                open: open_transition,
                close: close_transition,
            },
            effects,
        }
    }

    /// Fire both categories concurrently when the user allows it.
    async fn fire_effects(&self, open: Option<Notice>, close: Option<Notice>) -> FiredEffects {
        if !self.preference.is_enabled().await {
            debug!("Notifications disabled; skipping device effects");
            return FiredEffects::default();
        }
        if self.is_shut_down() {
            return FiredEffects::default();
        }

        let (open, close) = tokio::join!(self.fire_one(open), self.fire_one(close));
        FiredEffects { open, close }
    }

    async fn fire_one(&self, notice: Option<Notice>) -> Option<EffectReport> {
        let notice = notice?;
        self.effects.fire(&notice).await
    }

    fn refresh_visibility(&self) {
        let wall_now = (self.clock)();
        let now = Instant::now();
        self.board.send_if_modified(|board| board.refresh(wall_now, now));
    }
}

/// Log a notifying transition and build its notice.
fn announce<T: AlertRecord>(transition: Transition, record: Option<&T>) -> Option<Notice> {
    let record = record.filter(|_| transition.notifies())?;
    let kind = T::KIND;
    info!(
        kind = %kind,
        pair = record.pair(),
        transition = ?transition,
        "Trade alert changed"
    );
    Some(record.notice())
}
