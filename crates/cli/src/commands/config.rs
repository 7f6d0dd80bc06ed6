//! Configuration check command.

use secrecy::ExposeSecret;
use storefront_gateway::config::{ConfigError, GatewayConfig};

/// Print the configuration the gateway would start with.
///
/// Secrets are never printed; only whether they are set.
///
/// # Errors
///
/// Returns an error if the environment does not hold a valid configuration.
pub fn show() -> Result<(), ConfigError> {
    let config = GatewayConfig::from_env()?;

    let origins = config.allowed_origins.iter().collect::<Vec<_>>().join(", ");
    let shopify = config.shopify.as_ref().map_or_else(
        || "not configured".to_string(),
        |s| {
            format!(
                "{} (api {}, token {} chars, status page {})",
                s.store_domain,
                s.api_version,
                s.access_token.expose_secret().len(),
                s.status_page_url
            )
        },
    );
    let claude = if config.claude.api_key.is_some() {
        format!("configured (default model {})", config.claude.model)
    } else {
        "not configured".to_string()
    };

    #[allow(clippy::print_stdout)]
    {
        println!("listen:           {}", config.socket_addr());
        println!("allowed origins:  {origins}");
        println!("upstream timeout: {}s", config.upstream_timeout.as_secs());
        println!("shopify:          {shopify}");
        println!("claude:           {claude}");
        println!(
            "sentry:           {}",
            if config.sentry_dsn.is_some() { "enabled" } else { "disabled" }
        );
    }

    Ok(())
}
