//! Shopify Admin API order store.
//!
//! # Architecture
//!
//! - Orders are read with the Admin REST `orders.json` search endpoint
//! - Shopify is source of truth - no caching, no local state
//! - [`OrderStore`] is the seam the order resolver talks to, so lookups can
//!   be exercised against an in-memory store in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_gateway::shopify::{OrderSearch, OrderStore, ShopifyAdminClient};
//!
//! let client = ShopifyAdminClient::new(&config.shopify, config.upstream_timeout)?;
//! let result = client
//!     .search_orders(&OrderSearch::by_email(email))
//!     .await?;
//! ```

mod client;
pub mod types;

pub use client::ShopifyAdminClient;
pub use types::*;

use async_trait::async_trait;
use reqwest::StatusCode;
use storefront_gateway_core::Email;
use thiserror::Error;

/// Longest upstream body kept for diagnostics.
const MAX_DETAIL_LEN: usize = 2048;

/// Errors that can occur when talking to the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Network-level failure (DNS, TLS, connection reset, ...).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The upstream did not answer within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Shopify answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api { status: StatusCode, body: String },

    /// The client could not be built from configuration.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ShopifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl ShopifyError {
    /// Status code Shopify answered with, if it answered at all.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Best-effort detail for the client: the raw upstream body when there
    /// is one, the error message otherwise.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Api { body, .. } => truncate(body, MAX_DETAIL_LEN).to_string(),
            other => other.to_string(),
        }
    }
}

/// Filters for one `orders.json` search.
///
/// Searches always use `status=any` so open, closed and cancelled orders are
/// all visible; the customer does not know which one theirs is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSearch {
    /// Marked order name (`#1001`), or `None` to search by email only.
    pub name: Option<String>,
    pub email: Email,
}

impl OrderSearch {
    #[must_use]
    pub const fn by_name_and_email(name: String, email: Email) -> Self {
        Self {
            name: Some(name),
            email,
        }
    }

    #[must_use]
    pub const fn by_email(email: Email) -> Self {
        Self { name: None, email }
    }
}

/// Outcome of a search that Shopify answered successfully.
#[derive(Debug, Clone)]
pub enum OrderSearchResult {
    /// The body parsed; possibly zero orders.
    Orders(Vec<UpstreamOrder>),
    /// The body did not parse. The (truncated) raw text is kept for logs.
    Unparseable { raw: String },
}

impl OrderSearchResult {
    /// Parse a successful `orders.json` body.
    ///
    /// A body that does not parse is not an error: the lookup is treated as
    /// inconclusive so the caller can fall back or report not found.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<OrdersEnvelope>(body) {
            Ok(envelope) => Self::Orders(envelope.orders),
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable orders response");
                Self::Unparseable {
                    raw: truncate(body, MAX_DETAIL_LEN).to_string(),
                }
            }
        }
    }

    /// The parsed orders; empty for an unparseable body.
    #[must_use]
    pub fn into_orders(self) -> Vec<UpstreamOrder> {
        match self {
            Self::Orders(orders) => orders,
            Self::Unparseable { .. } => Vec::new(),
        }
    }
}

/// A source of Shopify orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Run one order search.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Api`] when Shopify answers with a non-success
    /// status, and a transport variant when it does not answer at all.
    async fn search_orders(&self, search: &OrderSearch) -> Result<OrderSearchResult, ShopifyError>;
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.get(..end).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: "Invalid API key or access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error: 401 Unauthorized - Invalid API key or access token"
        );
        assert_eq!(err.upstream_status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_timeout_has_no_upstream_status() {
        assert_eq!(ShopifyError::Timeout.upstream_status(), None);
        assert_eq!(ShopifyError::Timeout.detail(), "Request timed out");
    }

    #[test]
    fn test_detail_is_truncated() {
        let err = ShopifyError::Api {
            status: StatusCode::BAD_GATEWAY,
            body: "x".repeat(MAX_DETAIL_LEN + 100),
        };
        assert_eq!(err.detail().len(), MAX_DETAIL_LEN);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 64), "short");
    }

    #[test]
    fn test_from_body_parses_orders() {
        let result = OrderSearchResult::from_body(
            r##"{"orders":[{"name":"#1001","fulfillment_status":null,"fulfillments":[]}]}"##,
        );
        let orders = result.into_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders.first().unwrap().name(), Some("#1001"));
    }

    #[test]
    fn test_from_body_keeps_unparseable_text() {
        let result = OrderSearchResult::from_body("<html>maintenance</html>");
        match &result {
            OrderSearchResult::Unparseable { raw } => assert_eq!(raw, "<html>maintenance</html>"),
            OrderSearchResult::Orders(_) => panic!("expected unparseable result"),
        }
        assert!(result.into_orders().is_empty());
    }

    #[test]
    fn test_from_body_without_orders_key_is_empty() {
        let result = OrderSearchResult::from_body(r#"{"errors":"Not Found"}"#);
        assert!(matches!(result, OrderSearchResult::Orders(ref o) if o.is_empty()));
    }
}
