//! Device double that records every capability call.

use crate::device::{DeviceEffects, LocalNotifier, SideEffectError, SoundPlayer, Vibrator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Device double that records every call.
#[derive(Default)]
pub struct RecordingDevice {
    pub sounds: AtomicU32,
    pub reloads: AtomicU32,
    pub vibrations: AtomicU32,
    /// Remaining sound calls that should fail.
    pub failing_sounds: AtomicU32,
    pub fail_vibration: AtomicBool,
    pub fail_notification: AtomicBool,
    pub released: AtomicBool,
    notifications: Mutex<Vec<(String, String)>>,
}

impl RecordingDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Effects wired entirely to this device.
    pub fn effects(self: &Arc<Self>) -> DeviceEffects {
        DeviceEffects::new(self.clone(), self.clone()).with_notifier(self.clone())
    }

    pub fn sound_count(&self) -> u32 {
        self.sounds.load(Ordering::SeqCst)
    }

    pub fn vibration_count(&self) -> u32 {
        self.vibrations.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoundPlayer for RecordingDevice {
    async fn play_short_sound(&self) -> Result<(), SideEffectError> {
        let failing = self
            .failing_sounds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SideEffectError::Sound("clip not loaded".to_string()));
        }
        self.sounds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self) -> Result<(), SideEffectError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Vibrator for RecordingDevice {
    async fn vibrate(&self, _pattern: &[u64]) -> Result<(), SideEffectError> {
        if self.fail_vibration.load(Ordering::SeqCst) {
            return Err(SideEffectError::Vibration("no motor".to_string()));
        }
        self.vibrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl LocalNotifier for RecordingDevice {
    async fn show_local_notification(
        &self,
        title: &str,
        body: &str,
    ) -> Result<(), SideEffectError> {
        if self.fail_notification.load(Ordering::SeqCst) {
            return Err(SideEffectError::Notification("permission denied".to_string()));
        }
        if let Ok(mut n) = self.notifications.lock() {
            n.push((title.to_string(), body.to_string()));
        }
        Ok(())
    }
}
