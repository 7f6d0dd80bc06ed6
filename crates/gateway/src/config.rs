//! Gateway configuration loaded from environment variables.
//!
//! Configuration is read once at startup into an immutable [`GatewayConfig`]
//! and handed to the access gate and the upstream clients through
//! [`AppState`](crate::state::AppState). Nothing reads the environment after
//! that.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GATEWAY_ALLOWED_ORIGINS` - Comma-separated storefront origins allowed to call the API
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_API_TOKEN` - Admin API access token
//! - `SHOPIFY_API_VERSION` - Admin REST API version (default: 2025-01)
//! - `ORDER_STATUS_PAGE_URL` - Status page shown when an order has none
//!   (default: `https://{SHOPIFY_STORE_DOMAIN}/account/orders`)
//! - `UPSTREAM_TIMEOUT_SECS` - Per-call timeout for upstream requests, at least 1 (default: 10)
//! - `ANTHROPIC_API_KEY` - Claude API key for the chat relay
//! - `CLAUDE_MODEL` - Default model for the chat relay (default: claude-3-sonnet-20240229)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! The Shopify and Anthropic credentials are optional at startup: a gateway
//! without them still serves preflights and answers the affected routes with
//! a 500 explaining what is missing.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::middleware::access_gate::{AllowedOrigins, OriginError};

const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_CLAUDE_MODEL: &str = "claude-3-sonnet-20240229";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

impl ConfigError {
    fn invalid(key: &str, err: impl ToString) -> Self {
        Self::InvalidEnvVar(key.to_string(), err.to_string())
    }
}

impl From<OriginError> for ConfigError {
    fn from(err: OriginError) -> Self {
        Self::invalid("GATEWAY_ALLOWED_ORIGINS", err)
    }
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origins the access gate lets through
    pub allowed_origins: AllowedOrigins,
    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,
    /// Shopify Admin API configuration, if credentials are present
    pub shopify: Option<ShopifyAdminConfig>,
    /// Claude relay configuration
    pub claude: ClaudeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shopify Admin REST API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyAdminConfig {
    /// Store domain without scheme (e.g., your-store.myshopify.com)
    pub store_domain: String,
    /// Admin REST API version (e.g., 2025-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
    /// Status page linked when an order carries no `order_status_url`
    pub status_page_url: String,
}

impl std::fmt::Debug for ShopifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("status_page_url", &self.status_page_url)
            .finish()
    }
}

/// Claude relay configuration.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key, if present
    pub api_key: Option<SecretString>,
    /// Model used when the request does not name one
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if a supplied secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("GATEWAY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::invalid("GATEWAY_HOST", e))?;
        let port = get_env_or_default("GATEWAY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::invalid("GATEWAY_PORT", e))?;
        let allowed_origins = AllowedOrigins::parse(&get_required_env("GATEWAY_ALLOWED_ORIGINS")?)?;
        let upstream_timeout = upstream_timeout_from(get_optional_env)?;
        let shopify = ShopifyAdminConfig::from_lookup(get_optional_env)?;

        Ok(Self {
            host,
            port,
            allowed_origins,
            upstream_timeout,
            shopify,
            claude: ClaudeConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// The subset of configuration needed to run order lookups outside the
/// server. Unlike [`GatewayConfig`] it needs no allow-list.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Shopify Admin API configuration, if credentials are present
    pub shopify: Option<ShopifyAdminConfig>,
    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,
}

impl LookupConfig {
    /// Load the Shopify section and `UPSTREAM_TIMEOUT_SECS` from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a present variable is invalid or the access
    /// token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(get_optional_env)
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            shopify: ShopifyAdminConfig::from_lookup(&get)?,
            upstream_timeout: upstream_timeout_from(&get)?,
        })
    }
}

impl ShopifyAdminConfig {
    /// Build from a variable lookup; `None` unless both domain and token are set.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let (Some(domain), Some(token)) = (get("SHOPIFY_STORE_DOMAIN"), get("SHOPIFY_ADMIN_API_TOKEN"))
        else {
            return Ok(None);
        };

        validate_secret_strength(&token, "SHOPIFY_ADMIN_API_TOKEN")?;
        let store_domain = normalize_store_domain(&domain);
        if store_domain.is_empty() {
            return Err(ConfigError::invalid("SHOPIFY_STORE_DOMAIN", "empty domain"));
        }

        let status_page_url = get("ORDER_STATUS_PAGE_URL")
            .unwrap_or_else(|| format!("https://{store_domain}/account/orders"));
        url::Url::parse(&status_page_url)
            .map_err(|e| ConfigError::invalid("ORDER_STATUS_PAGE_URL", e))?;

        Ok(Some(Self {
            store_domain,
            api_version: get("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            access_token: SecretString::from(token),
            status_page_url,
        }))
    }
}

/// Read `UPSTREAM_TIMEOUT_SECS`; zero is rejected since every call would fail.
fn upstream_timeout_from(get: impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    let secs = get("UPSTREAM_TIMEOUT_SECS").map_or(Ok(DEFAULT_UPSTREAM_TIMEOUT_SECS), |raw| {
        raw.parse::<u64>()
            .map_err(|e| ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", e))
    })?;
    if secs == 0 {
        return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", "must be at least 1"));
    }
    Ok(Duration::from_secs(secs))
}

impl ClaudeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_optional_env("ANTHROPIC_API_KEY")
            .map(|key| {
                validate_secret_strength(&key, "ANTHROPIC_API_KEY")?;
                Ok::<_, ConfigError>(SecretString::from(key))
            })
            .transpose()?;

        Ok(Self {
            api_key,
            model: get_env_or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Reduce `https://shop.myshopify.com/` to `shop.myshopify.com`.
fn normalize_store_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_ascii_lowercase()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject secrets that are obviously placeholders or have too little entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
