//! REST fetcher for the open/close trade alert endpoints.
//!
//! Each endpoint answers `GET` with `{"data": <record|null>}`.

use crate::error::FetchError;
use crate::source::{AlertSnapshot, AlertSource};
use async_trait::async_trait;
use ffpinvest_core::{AlertRecord, CloseTradeAlert, OpenTradeAlert};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Endpoint configuration for the alert service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Service base URL, without trailing slash.
    pub base_url: String,
    /// Path of the "current open alert" endpoint.
    pub open_path: String,
    /// Path of the "current close alert" endpoint.
    pub close_path: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ffpinvest.ertaccess.cc".to_string(),
            open_path: "/get_open_alert".to_string(),
            close_path: "/get_close_alert".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RestConfig {
    /// Config pointing at another host with the default paths.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub fn open_url(&self) -> String {
        self.url(&self.open_path)
    }

    pub fn close_url(&self) -> String {
        self.url(&self.close_path)
    }
}

/// HTTP alert fetcher.
pub struct RestAlertFetcher {
    client: reqwest::Client,
    open_url: String,
    close_url: String,
}

impl RestAlertFetcher {
    pub fn new(config: &RestConfig) -> Result<Self, FetchError> {
        if config.base_url.trim().is_empty() {
            return Err(FetchError::Config("base_url is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            open_url: config.open_url(),
            close_url: config.close_url(),
        })
    }

    /// GET one endpoint and return its `data` value (`Null` when missing).
    async fn fetch_data(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint_name(url).to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)?;
        Ok(extract_data(json))
    }
}

#[async_trait]
impl AlertSource for RestAlertFetcher {
    async fn fetch_alerts(&self) -> Result<AlertSnapshot, FetchError> {
        let (open_data, close_data) = tokio::try_join!(
            self.fetch_data(&self.open_url),
            self.fetch_data(&self.close_url),
        )?;

        let open = decode::<OpenTradeAlert>(&open_data);
        let close = decode::<CloseTradeAlert>(&close_data);
        debug!(
            open = open.is_some(),
            close = close.is_some(),
            "Fetched trade alerts"
        );

        Ok(AlertSnapshot::new(open, close))
    }
}

/// Pull `data` out of a response body. Non-object bodies carry no alert.
pub fn extract_data(mut body: Value) -> Value {
    match body.get_mut("data") {
        Some(data) => data.take(),
        None => Value::Null,
    }
}

fn decode<T: AlertRecord>(data: &Value) -> Option<T> {
    let record = T::from_data(data);
    if record.is_none() && data.as_object().is_some_and(|o| !o.is_empty()) {
        let kind = T::KIND;
        warn!(kind = %kind, "Ignoring malformed alert record");
    }
    record
}

fn endpoint_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
