//! User notification preference.

use crate::store::{KeyValueStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key of the serialized boolean.
pub const NOTIFICATIONS_ENABLED_KEY: &str = "notificationsEnabled";

/// Whether alert changes may play sounds, vibrate and notify.
///
/// Stored as a JSON boolean string. Missing or unreadable values mean enabled.
#[derive(Clone)]
pub struct NotificationPreference {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationPreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the current preference. Storage failures fall back to enabled.
    pub async fn is_enabled(&self) -> bool {
        match self.store.get(NOTIFICATIONS_ENABLED_KEY).await {
            Ok(raw) => parse_preference(raw.as_deref()),
            Err(e) => {
                warn!(error = %e, "Failed to read notification preference, assuming enabled");
                true
            }
        }
    }

    pub async fn set(&self, enabled: bool) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&enabled)?;
        self.store.set(NOTIFICATIONS_ENABLED_KEY, &raw).await?;
        info!(enabled, "Notification preference updated");
        Ok(())
    }

    /// Flip the stored preference and return the new value.
    pub async fn toggle(&self) -> Result<bool, StoreError> {
        let next = !self.is_enabled().await;
        self.set(next).await?;
        Ok(next)
    }
}

/// Interpret a stored preference value.
pub fn parse_preference(raw: Option<&str>) -> bool {
    raw.and_then(|s| serde_json::from_str::<bool>(s.trim()).ok())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_parse_preference() {
        assert!(parse_preference(None));
        assert!(parse_preference(Some("true")));
        assert!(!parse_preference(Some("false")));
        assert!(!parse_preference(Some(" false ")));
        assert!(parse_preference(Some("garbage")));
        assert!(parse_preference(Some("")));
    }

    #[tokio::test]
    async fn test_default_is_enabled() {
        let pref = NotificationPreference::new(Arc::new(MemoryStore::new()));
        assert!(pref.is_enabled().await);
    }

    #[tokio::test]
    async fn test_set_and_toggle() {
        let store = Arc::new(MemoryStore::new());
        let pref = NotificationPreference::new(store.clone());

        pref.set(false).await.unwrap();
        assert!(!pref.is_enabled().await);
        assert_eq!(
            store.get(NOTIFICATIONS_ENABLED_KEY).await.unwrap().as_deref(),
            Some("false")
        );

        assert!(pref.toggle().await.unwrap());
        assert!(pref.is_enabled().await);
        assert!(!pref.toggle().await.unwrap());
    }
}
