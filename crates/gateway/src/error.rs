//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors are rendered as JSON
//! `{ "error": ..., "detail"?: ... }` bodies; server-side failures are
//! captured to Sentry before responding. Access-control headers are added by
//! the access gate afterwards, so nothing here needs to know about CORS.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::claude::ClaudeError;
use crate::shopify::ShopifyError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request origin is absent or not on the allow-list.
    #[error("Origin not allowed: {}", .0.as_deref().unwrap_or("<none>"))]
    OriginRejected(Option<String>),

    /// Verb not supported by the route.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Credentials for an upstream are not configured.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Shopify order store failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Claude relay failed.
    #[error("Claude error: {0}")]
    Claude(#[from] ClaudeError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            origin: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Upstream API failures keep the upstream's own status code; transport
    /// failures without one map to 500.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::OriginRejected(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Shopify(err) => err.upstream_status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Claude(err) => err.upstream_status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::ConfigurationMissing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) => ErrorBody::new(message.clone()),
            Self::OriginRejected(origin) => ErrorBody {
                origin: origin.clone(),
                ..ErrorBody::new("Origin not allowed")
            },
            Self::MethodNotAllowed => ErrorBody::new("Method not allowed"),
            Self::ConfigurationMissing(message) => ErrorBody::new(message.clone()),
            Self::Shopify(err) => ErrorBody::new("Shopify error").with_detail(err.detail()),
            Self::Claude(err) => ErrorBody::new("Anthropic error").with_detail(err.detail()),
            // Don't expose internal error details to clients
            Self::Internal(_) => ErrorBody::new("Server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::Shopify(_) | Self::Claude(_)) {
            tracing::warn!(error = %self, status = status.as_u16(), "Upstream rejected request");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
