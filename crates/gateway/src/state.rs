//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::Method;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::GatewayConfig;
use crate::middleware::access_gate::AccessGate;
use crate::services::OrderResolver;
use crate::shopify::{ShopifyAdminClient, ShopifyError};

/// Error building upstream clients from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("claude client: {0}")]
    Claude(#[from] ClaudeError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the access gate and whichever upstream
/// clients are configured; a missing client makes its route answer 500.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gate: AccessGate,
    orders: Option<OrderResolver>,
    claude: Option<ClaudeClient>,
}

impl AppState {
    /// Create application state from explicit parts.
    ///
    /// Tests use this to plug in an in-memory order store.
    #[must_use]
    pub fn new(
        config: &GatewayConfig,
        orders: Option<OrderResolver>,
        claude: Option<ClaudeClient>,
    ) -> Self {
        let gate = AccessGate::new(config.allowed_origins.clone(), Method::POST);

        Self {
            inner: Arc::new(AppStateInner {
                gate,
                orders,
                claude,
            }),
        }
    }

    /// Build the Shopify and Claude clients named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured credential cannot be used to build
    /// its client.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StateError> {
        let orders = config
            .shopify
            .as_ref()
            .map(|shopify| {
                let client = ShopifyAdminClient::new(shopify, config.upstream_timeout)?;
                Ok::<_, StateError>(OrderResolver::new(
                    Arc::new(client),
                    shopify.status_page_url.clone(),
                ))
            })
            .transpose()?;

        let claude = config
            .claude
            .api_key
            .as_ref()
            .map(|key| ClaudeClient::new(key, &config.claude.model, config.upstream_timeout))
            .transpose()?;

        Ok(Self::new(config, orders, claude))
    }

    /// Get a reference to the access gate.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    /// The order resolver, if Shopify credentials are configured.
    #[must_use]
    pub fn orders(&self) -> Option<&OrderResolver> {
        self.inner.orders.as_ref()
    }

    /// The Claude relay client, if an API key is configured.
    #[must_use]
    pub fn claude(&self) -> Option<&ClaudeClient> {
        self.inner.claude.as_ref()
    }
}
