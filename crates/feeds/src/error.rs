//! Error types for alert retrieval.

use thiserror::Error;

/// Errors that fail a single poll cycle.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid endpoint configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl FetchError {
    /// Returns true if the next scheduled poll is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Parse(_) | FetchError::Config(_) => false,
        }
    }

    /// Short message for the retry screen.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Status { .. } => {
                "Network response was not ok".to_string()
            }
            FetchError::Parse(_) => "Received an unreadable response".to_string(),
            FetchError::Config(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::Timeout("10s".into()).is_transient());
        assert!(FetchError::Status { endpoint: "get_open_alert".into(), status: 503 }.is_transient());
        assert!(!FetchError::Status { endpoint: "get_open_alert".into(), status: 404 }.is_transient());
        assert!(!FetchError::Parse("eof".into()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = FetchError::Status { endpoint: "get_close_alert".into(), status: 502 };
        assert_eq!(err.to_string(), "get_close_alert returned HTTP 502");
        assert_eq!(err.user_message(), "Network response was not ok");
    }

    #[test]
    fn test_from_serde_error() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
