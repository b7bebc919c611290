//! Trade alert polling and notification.
//!
//! This crate provides:
//! - Key-value persistence for user preferences (SQLite or in-memory)
//! - Host capability seams for sound, vibration and local notifications
//! - The alert poller with change detection and popup/visibility state
//! - An injectable session service with an explicit lifecycle

pub mod board;
pub mod device;
pub mod poller;
pub mod preference;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod session;
pub mod store;
pub mod task;

pub use board::{AlertBoard, PollStatus};
pub use device::{
    DeviceEffects, EffectReport, LocalNotifier, SideEffectError, SoundPlayer, Vibrator,
    VIBRATION_PATTERN_MS,
};
pub use poller::{AlertPoller, CycleReport, FiredEffects, PollOutcome, PollerConfig, WallClock};
pub use preference::{NotificationPreference, NOTIFICATIONS_ENABLED_KEY};
#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingDevice;
pub use session::{IdentityProvider, Lifecycle, SessionError, SessionService, USER_KEY};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use task::{spawn_interval, TaskHandle};
