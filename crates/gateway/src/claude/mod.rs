//! Claude Messages API relay.
//!
//! The storefront chat widget talks to Claude through the gateway so the API
//! key never reaches the browser. Requests are forwarded with defaults filled
//! in and responses come back untouched.

mod client;

pub use client::{ChatRelayRequest, ClaudeClient};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the Claude relay.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// Network-level failure.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The upstream did not answer within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Anthropic answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api { status: StatusCode, body: String },

    /// Anthropic answered 2xx with a body that is not JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The client could not be built from configuration.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClaudeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl ClaudeError {
    /// Status code Anthropic answered with, if it answered at all.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Api { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_status_and_body() {
        let err = ClaudeError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "{\"type\":\"error\"}".to_string(),
        };
        assert_eq!(err.upstream_status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.detail(), "{\"type\":\"error\"}");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ClaudeError::Parse("expected value".to_string());
        assert_eq!(err.to_string(), "Parse error: expected value");
        assert_eq!(err.upstream_status(), None);
    }
}
