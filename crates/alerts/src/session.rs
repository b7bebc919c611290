//! Signed-in user session.
//!
//! The identity SDK is an external collaborator reached through
//! [`IdentityProvider`]; this service only restores and caches the user id.

use crate::store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{error, info};

/// Storage key of the signed-in user's subject id.
pub const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// A service with an explicit start/stop lifecycle.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start(&self) -> Result<(), SessionError>;

    /// Idempotent.
    fn stop(&self);
}

/// Source of the signed-in user's attributes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subject id of the current user, if anyone is signed in.
    async fn current_subject(&self) -> Result<Option<String>, SessionError>;
}

pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn IdentityProvider>,
    user: RwLock<Option<String>>,
    started: AtomicBool,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            provider,
            user: RwLock::new(None),
            started: AtomicBool::new(false),
        }
    }

    pub fn current_user(&self) -> Option<String> {
        self.user.read().ok().and_then(|u| u.clone())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn set_user(&self, user: Option<String>) {
        if let Ok(mut lock) = self.user.write() {
            *lock = user;
        }
    }
}

#[async_trait]
impl Lifecycle for SessionService {
    /// Restore the stored user, or ask the provider and persist the answer.
    async fn start(&self) -> Result<(), SessionError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let stored = self
            .store
            .get(USER_KEY)
            .await?
            .filter(|u| !u.trim().is_empty());
        if let Some(user) = stored {
            info!(user = %user, "Restored session");
            self.set_user(Some(user));
            return Ok(());
        }

        match self.provider.current_subject().await {
            Ok(Some(sub)) if !sub.trim().is_empty() => {
                self.store.set(USER_KEY, &sub).await?;
                info!(user = %sub, "Session established");
                self.set_user(Some(sub));
            }
            Ok(_) => {
                error!("Identity provider returned no valid user id");
            }
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(())
    }

    fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.set_user(None);
            info!("Session stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::AtomicU32;

    struct FakeProvider {
        subject: Option<String>,
        fail: bool,
        calls: AtomicU32,
    }

    impl FakeProvider {
        fn new(subject: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                subject: subject.map(str::to_string),
                fail: false,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn current_subject(&self) -> Result<Option<String>, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionError::Provider("not signed in".to_string()));
            }
            Ok(self.subject.clone())
        }
    }

    #[tokio::test]
    async fn test_restores_stored_user_without_provider() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "sub-123").await.unwrap();
        let provider = FakeProvider::new(Some("other"));

        let session = SessionService::new(store, provider.clone());
        session.start().await.unwrap();

        assert_eq!(session.current_user().as_deref(), Some("sub-123"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetches_and_persists_user() {
        let store = Arc::new(MemoryStore::new());
        let provider = FakeProvider::new(Some("sub-456"));

        let session = SessionService::new(store.clone(), provider);
        session.start().await.unwrap();

        assert_eq!(session.current_user().as_deref(), Some("sub-456"));
        assert_eq!(store.get(USER_KEY).await.unwrap().as_deref(), Some("sub-456"));
    }

    #[tokio::test]
    async fn test_blank_subject_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionService::new(store.clone(), FakeProvider::new(Some("  ")));
        session.start().await.unwrap();

        assert!(session.current_user().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_allows_restart() {
        let provider = Arc::new(FakeProvider {
            subject: None,
            fail: true,
            calls: AtomicU32::new(0),
        });
        let session = SessionService::new(Arc::new(MemoryStore::new()), provider);

        assert!(session.start().await.is_err());
        assert!(!session.is_started());
        assert!(session.start().await.is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let provider = FakeProvider::new(Some("sub-789"));
        let session = SessionService::new(Arc::new(MemoryStore::new()), provider.clone());

        session.start().await.unwrap();
        session.start().await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        session.stop();
        session.stop();
        assert!(!session.is_started());
        assert!(session.current_user().is_none());
    }
}
