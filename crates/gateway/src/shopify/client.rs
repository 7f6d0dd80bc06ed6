//! Admin REST API client for order searches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::ShopifyAdminConfig;

use super::{OrderSearch, OrderSearchResult, OrderStore, ShopifyError};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify Admin REST API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ShopifyAdminClient {
    inner: Arc<ShopifyAdminClientInner>,
}

struct ShopifyAdminClientInner {
    client: reqwest::Client,
    orders_endpoint: String,
}

impl ShopifyAdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `config` - Store domain, API version and access token
    /// * `timeout` - Upper bound for each request, including reading the body
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &ShopifyAdminConfig, timeout: Duration) -> Result<Self, ShopifyError> {
        Self::with_base_url(
            &format!("https://{}", config.store_domain),
            &config.api_version,
            &config.access_token,
            timeout,
        )
    }

    /// Create a client against an explicit base URL (scheme and host).
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn with_base_url(
        base_url: &str,
        api_version: &str,
        access_token: &SecretString,
        timeout: Duration,
    ) -> Result<Self, ShopifyError> {
        let mut token = HeaderValue::from_str(access_token.expose_secret())
            .map_err(|e| ShopifyError::Config(format!("Invalid access token format: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyAdminClientInner {
                client,
                orders_endpoint: format!(
                    "{}/admin/api/{api_version}/orders.json",
                    base_url.trim_end_matches('/')
                ),
            }),
        })
    }

    /// Full search URL with every filter value percent-encoded.
    fn search_url(&self, search: &OrderSearch) -> String {
        let email = urlencoding::encode(search.email.as_str());
        match &search.name {
            Some(name) => format!(
                "{}?name={}&email={email}&status=any",
                self.inner.orders_endpoint,
                urlencoding::encode(name)
            ),
            None => format!("{}?email={email}&status=any", self.inner.orders_endpoint),
        }
    }
}

#[async_trait]
impl OrderStore for ShopifyAdminClient {
    #[instrument(
        skip(self, search),
        fields(name = search.name.as_deref().unwrap_or("<any>"), email = %search.email.redacted())
    )]
    async fn search_orders(&self, search: &OrderSearch) -> Result<OrderSearchResult, ShopifyError> {
        let response = self
            .inner
            .client
            .get(self.search_url(search))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ShopifyError::Api { status, body });
        }

        let result = OrderSearchResult::from_body(&body);
        if let OrderSearchResult::Orders(orders) = &result {
            tracing::debug!(count = orders.len(), "Order search completed");
        }
        Ok(result)
    }
}
