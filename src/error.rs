//! Widget error types
//!
//! Failure taxonomy of the notification widget. None of these are fatal:
//! every failure leaves the widget in a visible but inert state.

use crate::client::ApiError;
use thiserror::Error;

/// Errors surfaced by the poller and the interaction handler
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport error, timeout or non-success status while fetching
    #[error("Network failure: {0}")]
    Network(#[source] ApiError),

    /// The server answered with a body that is not the expected JSON
    #[error("Malformed response: {0}")]
    Parse(String),

    /// A toggle or mark-all request failed; nothing was changed locally
    #[error("{action} failed: {source}")]
    UserAction {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    /// Too many consecutive fetch failures; the widget no longer polls
    #[error("Connection lost after {failures} consecutive failures")]
    ConnectionLost { failures: u32 },
}

impl NotifyError {
    /// Classify a failed fetch
    pub fn from_fetch(err: ApiError) -> Self {
        match err {
            ApiError::Parse(msg) => NotifyError::Parse(msg),
            other => NotifyError::Network(other),
        }
    }

    /// Whether this error counts toward the consecutive failure threshold
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, NotifyError::Network(_) | NotifyError::Parse(_))
    }
}

/// Result type alias for widget operations
pub type NotifyResult<T> = Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_is_counted() {
        let err = NotifyError::from_fetch(ApiError::Parse("expected value".to_string()));
        assert!(matches!(err, NotifyError::Parse(_)));
        assert!(err.counts_as_failure());

        let err = NotifyError::from_fetch(ApiError::Timeout);
        assert!(matches!(err, NotifyError::Network(_)));
        assert!(err.counts_as_failure());
    }

    #[test]
    fn test_user_action_not_counted() {
        let err = NotifyError::UserAction {
            action: "mark all read",
            source: ApiError::Unavailable,
        };
        assert!(!err.counts_as_failure());
        assert_eq!(err.to_string(), "mark all read failed: Server unavailable");
    }

    #[test]
    fn test_connection_lost_display() {
        let err = NotifyError::ConnectionLost { failures: 10 };
        assert_eq!(
            err.to_string(),
            "Connection lost after 10 consecutive failures"
        );
    }
}
