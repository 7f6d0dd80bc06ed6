//! Order lookup command.
//!
//! Runs the same resolver the `/api/track-order` route uses, without the
//! access gate, and prints the reply the storefront would receive.
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain
//! - `SHOPIFY_ADMIN_API_TOKEN` - Admin API access token
//! - `SHOPIFY_API_VERSION`, `ORDER_STATUS_PAGE_URL`, `UPSTREAM_TIMEOUT_SECS` - Optional

use std::sync::Arc;

use storefront_gateway::config::{ConfigError, LookupConfig};
use storefront_gateway::services::{LookupError, OrderResolver, TrackingLookup};
use storefront_gateway::shopify::{ShopifyAdminClient, ShopifyError};
use storefront_gateway_core::{Email, EmailError, OrderNumber, OrderNumberError};
use thiserror::Error;

/// Errors that can occur during an order lookup.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shopify credentials are absent from the environment.
    #[error("SHOPIFY_STORE_DOMAIN and SHOPIFY_ADMIN_API_TOKEN must be set")]
    NotConfigured,

    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Shopify client: {0}")]
    Client(#[from] ShopifyError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Failed to render reply: {0}")]
    Render(#[from] serde_json::Error),
}

/// Resolve an order and print the tracking reply as JSON.
///
/// # Errors
///
/// Returns an error if configuration is missing, the inputs do not parse,
/// Shopify rejects the search, or no order matches.
pub async fn run(order: &str, email: &str) -> Result<(), TrackError> {
    let lookup = TrackingLookup {
        order_number: OrderNumber::parse(order)?,
        email: Email::parse(email)?,
    };

    let config = LookupConfig::from_env()?;
    let shopify = config.shopify.as_ref().ok_or(TrackError::NotConfigured)?;

    tracing::info!(store = %shopify.store_domain, order = %lookup.order_number, "Looking up order");

    let client = ShopifyAdminClient::new(shopify, config.upstream_timeout)?;
    let resolver = OrderResolver::new(Arc::new(client), shopify.status_page_url.clone());

    let resolved = resolver.resolve(&lookup).await?;
    tracing::info!(matched_by = ?resolved.matched_by, "Order resolved");

    let reply = resolver.reply(resolved);

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }

    Ok(())
}
