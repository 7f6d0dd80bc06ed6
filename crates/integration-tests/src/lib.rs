//! Integration test support for Storefront Gateway.
//!
//! Tests drive the full router in-process with `tower::ServiceExt::oneshot`.
//! Shopify is replaced by a [`RecordingOrderStore`] that answers from a
//! script and remembers every search, so tests can assert both the reply
//! and how many upstream calls it took.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-gateway-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use storefront_gateway::claude::ClaudeClient;
use storefront_gateway::config::{ClaudeConfig, GatewayConfig};
use storefront_gateway::middleware::AllowedOrigins;
use storefront_gateway::services::OrderResolver;
use storefront_gateway::shopify::{OrderSearch, OrderSearchResult, OrderStore, ShopifyError};
use storefront_gateway::state::AppState;

/// Origin on the test allow-list.
pub const ALLOWED_ORIGIN: &str = "https://shop.example";

/// Origin the gate must refuse.
pub const FOREIGN_ORIGIN: &str = "https://evil.example";

/// Status page used when an order carries none.
pub const STATUS_PAGE: &str = "https://shop.example/account/orders";

/// Order store that replays scripted answers and records every search.
///
/// Once the script runs out, every further search answers with no orders.
#[derive(Default)]
pub struct RecordingOrderStore {
    answers: Mutex<VecDeque<Result<OrderSearchResult, ShopifyError>>>,
    searches: Mutex<Vec<OrderSearch>>,
}

impl RecordingOrderStore {
    /// Create a store answering with `answers`, in order.
    #[must_use]
    pub fn answering(answers: Vec<Result<OrderSearchResult, ShopifyError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            searches: Mutex::default(),
        })
    }

    /// Every search received so far.
    #[must_use]
    pub fn searches(&self) -> Vec<OrderSearch> {
        self.searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OrderStore for RecordingOrderStore {
    async fn search_orders(&self, search: &OrderSearch) -> Result<OrderSearchResult, ShopifyError> {
        self.searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(search.clone());
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(OrderSearchResult::Orders(Vec::new())))
    }
}

/// A successful `orders.json` answer with the given body.
#[must_use]
pub fn orders_body(body: &str) -> Result<OrderSearchResult, ShopifyError> {
    Ok(OrderSearchResult::from_body(body))
}

/// Configuration with [`ALLOWED_ORIGIN`] on the allow-list and no upstreams.
///
/// # Panics
///
/// Panics if the test origin does not parse.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        allowed_origins: AllowedOrigins::parse(ALLOWED_ORIGIN).expect("test origin parses"),
        upstream_timeout: Duration::from_secs(1),
        shopify: None,
        claude: ClaudeConfig {
            api_key: None,
            model: "claude-3-sonnet-20240229".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Application router backed by `store`.
#[must_use]
pub fn app_with_store(store: Arc<RecordingOrderStore>) -> Router {
    let resolver = OrderResolver::new(store, STATUS_PAGE);
    storefront_gateway::app(AppState::new(&test_config(), Some(resolver), None))
}

/// Application router with no upstreams configured.
#[must_use]
pub fn unconfigured_app() -> Router {
    storefront_gateway::app(AppState::new(&test_config(), None, None))
}

/// Application router with a Claude client that is never reached.
///
/// # Panics
///
/// Panics if the client fails to build.
#[must_use]
#[allow(clippy::expect_used)]
pub fn app_with_claude() -> Router {
    let key = SecretString::from("sk-ant-test-key".to_string());
    let client = ClaudeClient::new(&key, "claude-3-sonnet-20240229", Duration::from_secs(1))
        .expect("claude client builds");
    storefront_gateway::app(AppState::new(&test_config(), None, Some(client)))
}

/// Build a request with an optional `Origin` and JSON body.
///
/// # Panics
///
/// Panics if the request parts are invalid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn request(method: &str, uri: &str, origin: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .expect("valid request")
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON.
#[allow(clippy::expect_used)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
