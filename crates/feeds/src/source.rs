//! The retrieval seam the poller depends on.

use crate::error::FetchError;
use async_trait::async_trait;
use ffpinvest_core::{CloseTradeAlert, OpenTradeAlert};

/// Result of one successful retrieval. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertSnapshot {
    pub open: Option<OpenTradeAlert>,
    pub close: Option<CloseTradeAlert>,
}

impl AlertSnapshot {
    pub fn new(open: Option<OpenTradeAlert>, close: Option<CloseTradeAlert>) -> Self {
        Self { open, close }
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_none() && self.close.is_none()
    }
}

/// Something that can return the current open and close alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Fetch both alerts. Fails if either retrieval fails.
    async fn fetch_alerts(&self) -> Result<AlertSnapshot, FetchError>;
}
