//! Host device capabilities used when an alert changes.
//!
//! Every capability is best-effort: failures are logged and never reach the
//! poller's state.

use async_trait::async_trait;
use ffpinvest_core::Notice;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Vibration pattern in milliseconds: wait, buzz, pause, buzz.
pub const VIBRATION_PATTERN_MS: [u64; 4] = [0, 500, 200, 500];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SideEffectError {
    #[error("Sound playback failed: {0}")]
    Sound(String),
    #[error("Vibration failed: {0}")]
    Vibration(String),
    #[error("Notification failed: {0}")]
    Notification(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
}

/// Short alert chime.
#[async_trait]
pub trait SoundPlayer: Send + Sync {
    async fn play_short_sound(&self) -> Result<(), SideEffectError>;

    /// Recreate the underlying clip after a failed play.
    async fn reload(&self) -> Result<(), SideEffectError> {
        Ok(())
    }

    /// Free the audio resource. Called once on teardown.
    fn release(&self);
}

#[async_trait]
pub trait Vibrator: Send + Sync {
    async fn vibrate(&self, pattern: &[u64]) -> Result<(), SideEffectError>;
}

#[async_trait]
pub trait LocalNotifier: Send + Sync {
    async fn show_local_notification(&self, title: &str, body: &str)
        -> Result<(), SideEffectError>;
}

/// Which effects of one batch went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub sound: bool,
    pub vibration: bool,
    /// `None` when no notifier is configured.
    pub notification: Option<bool>,
}

/// The set of capabilities fired together for one alert change.
#[derive(Clone)]
pub struct DeviceEffects {
    sound: Arc<dyn SoundPlayer>,
    vibrator: Arc<dyn Vibrator>,
    notifier: Option<Arc<dyn LocalNotifier>>,
    sound_attempts: u32,
    timeout: Duration,
    released: Arc<AtomicBool>,
}

impl DeviceEffects {
    pub fn new(sound: Arc<dyn SoundPlayer>, vibrator: Arc<dyn Vibrator>) -> Self {
        Self {
            sound,
            vibrator,
            notifier: None,
            sound_attempts: 2,
            timeout: Duration::from_secs(5),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LocalNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Total play attempts per batch, including the first.
    pub fn with_sound_attempts(mut self, attempts: u32) -> Self {
        self.sound_attempts = attempts.max(1);
        self
    }

    /// Upper bound on each individual capability call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fire sound, vibration and notification concurrently.
    ///
    /// Returns `None` without touching the device once released.
    pub async fn fire(&self, notice: &Notice) -> Option<EffectReport> {
        if self.released.load(Ordering::SeqCst) {
            debug!("Skipping side effects: audio already released");
            return None;
        }

        let sound = self.play_with_retry();
        let vibration = async {
            let result =
                bounded(self.timeout, "vibration", self.vibrator.vibrate(&VIBRATION_PATTERN_MS)).await;
            log_failure(result)
        };
        let notification = async {
            match &self.notifier {
                Some(notifier) => {
                    let call = notifier.show_local_notification(&notice.title, &notice.body);
                    Some(log_failure(bounded(self.timeout, "notification", call).await))
                }
                None => None,
            }
        };

        let (sound, vibration, notification) = tokio::join!(sound, vibration, notification);
        Some(EffectReport {
            sound,
            vibration,
            notification,
        })
    }

    async fn play_with_retry(&self) -> bool {
        for attempt in 1..=self.sound_attempts {
            match bounded(self.timeout, "sound", self.sound.play_short_sound()).await {
                Ok(()) => return true,
                Err(e) => {
                    warn!(attempt, max = self.sound_attempts, error = %e, "Alert sound failed");
                    if attempt < self.sound_attempts {
                        if let Err(e) = self.sound.reload().await {
                            warn!(error = %e, "Failed to reload alert sound");
                        }
                    }
                }
            }
        }
        false
    }

    /// Release the audio resource. Safe to call more than once.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.sound.release();
            debug!("Alert sound released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

async fn bounded<F>(timeout: Duration, what: &'static str, call: F) -> Result<(), SideEffectError>
where
    F: Future<Output = Result<(), SideEffectError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SideEffectError::Timeout(what)),
    }
}

fn log_failure(result: Result<(), SideEffectError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Side effect failed");
            false
        }
    }
}
