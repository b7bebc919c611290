//! Scripted alert source.

use crate::error::FetchError;
use crate::source::{AlertSnapshot, AlertSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Mock source that replays scripted results in order.
///
/// Once the script runs out the last result is repeated, which mirrors a
/// service whose alerts stopped changing.
#[derive(Default)]
pub struct MockAlertSource {
    script: Mutex<VecDeque<Result<AlertSnapshot, FetchError>>>,
    last: Mutex<Option<Result<AlertSnapshot, FetchError>>>,
    calls: AtomicU64,
}

impl MockAlertSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from a full script.
    pub fn with_script(results: Vec<Result<AlertSnapshot, FetchError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    /// Append a result to the script.
    pub fn push(&self, result: Result<AlertSnapshot, FetchError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
    }

    /// Number of `fetch_alerts` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSource for MockAlertSource {
    async fn fetch_alerts(&self) -> Result<AlertSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let mut last = self
            .last
            .lock()
            .map_err(|_| FetchError::Network("mock poisoned".to_string()))?;
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| Ok(AlertSnapshot::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_then_repeats() {
        let source = MockAlertSource::with_script(vec![
            Ok(AlertSnapshot::default()),
            Err(FetchError::Network("down".to_string())),
        ]);

        assert!(source.fetch_alerts().await.is_ok());
        assert!(source.fetch_alerts().await.is_err());
        assert!(source.fetch_alerts().await.is_err());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_mock_returns_empty_snapshot() {
        let source = MockAlertSource::new();
        let snapshot = source.fetch_alerts().await.unwrap();
        assert!(snapshot.is_empty());
    }
}
