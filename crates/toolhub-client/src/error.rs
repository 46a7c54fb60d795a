//! Error types for resource-client operations
//!
//! Every failure keeps the upstream HTTP status and the raw response text so
//! operators can diagnose against the upstream API's own documentation.

use std::time::Duration;
use thiserror::Error;

/// Resource-client error types.
///
/// Throttled attempts never surface here: the rate-limit guard absorbs them
/// and only reports `RateLimitExceeded` once its retry budget is spent.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure before any response was received
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status returned by the upstream API
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text, verbatim.
        body: String,
    },

    /// Decoded body did not have the expected array/object shape
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// Response body was not valid JSON
    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode {
        /// HTTP status of the undecodable response.
        status: u16,
        /// Decoder message.
        message: String,
    },

    /// Async job did not finish within the poll budget
    #[error("Job did not complete within {}s", budget.as_secs_f64())]
    Timeout {
        /// The wall-clock budget that elapsed.
        budget: Duration,
    },

    /// Server kept throttling after the configured number of replays
    #[error("Rate limit exceeded after {retries} retries: {body}")]
    RateLimitExceeded {
        /// Number of replays performed.
        retries: u32,
        /// Body of the last throttled response, verbatim.
        body: String,
    },

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// URL could not be parsed or joined onto the base path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No field policy is registered for the requested resource type
    #[error("No field policy registered for resource type: {0}")]
    UnregisteredResource(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::RateLimitExceeded { .. } => Some(429),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the upstream API rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    /// Whether the requested resource does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Result type for resource-client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_status_and_body() {
        let err = ClientError::Http {
            status: 422,
            body: r#"{"errors":["bad filter"]}"#.to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("422"));
        assert!(text.contains(r#"{"errors":["bad filter"]}"#));
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_status_helpers() {
        let unauthorized = ClientError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_not_found());

        let throttled = ClientError::RateLimitExceeded {
            retries: 5,
            body: "slow down".to_string(),
        };
        assert_eq!(throttled.status(), Some(429));
        assert_eq!(ClientError::Cancelled.status(), None);
    }

    #[test]
    fn test_timeout_names_budget() {
        let err = ClientError::Timeout {
            budget: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "Job did not complete within 120s");
    }
}
