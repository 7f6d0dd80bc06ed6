//! Origin and method gate for browser-facing API routes.
//!
//! Every gated route is wrapped by [`access_gate_middleware`], which decides
//! before the handler runs whether the request may proceed and stamps the
//! access-control headers onto whatever response leaves the route. Because
//! the headers are applied here rather than in handlers, error responses from
//! handlers carry them too and browsers can read the error body.
//!
//! # Decision order
//!
//! 1. `OPTIONS` - preflight, always `204 No Content`; headers only for allowed origins
//! 2. Origin not allowed (or absent) - `403 Forbidden`, no access-control headers
//! 3. Method other than the supported verb - `405 Method Not Allowed`, with headers
//! 4. Otherwise the request proceeds and the response gets headers

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";
const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

/// Errors parsing the configured origin allow-list.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("at least one origin is required")]
    Empty,
    #[error("invalid origin '{origin}': {reason}")]
    Invalid { origin: String, reason: String },
}

/// Normalized set of origins allowed to call gated routes.
///
/// Origins are stored as `scheme://host[:port]`, lower-cased and without a
/// trailing slash, so `https://Shop.Example/` and `https://shop.example`
/// are the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    /// Parse a comma-separated list of origins.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or an entry is not an
    /// `http`/`https` URL with a host.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        Self::new(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    /// Build an allow-list from individual origins.
    ///
    /// # Errors
    ///
    /// Same as [`AllowedOrigins::parse`].
    pub fn new<'a>(origins: impl IntoIterator<Item = &'a str>) -> Result<Self, OriginError> {
        let mut normalized = Vec::new();
        for origin in origins {
            let url = Url::parse(origin).map_err(|e| OriginError::Invalid {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
                return Err(OriginError::Invalid {
                    origin: origin.to_string(),
                    reason: "must be an http(s) origin with a host".to_string(),
                });
            }
            let origin = url.origin().ascii_serialization();
            if !normalized.contains(&origin) {
                normalized.push(origin);
            }
        }

        if normalized.is_empty() {
            return Err(OriginError::Empty);
        }
        Ok(Self(normalized))
    }

    /// Whether a request's `Origin` header value is on the list.
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        let candidate = normalize_origin(origin);
        self.0.iter().any(|allowed| *allowed == candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Normalize a request `Origin` value for comparison.
fn normalize_origin(origin: &str) -> String {
    match Url::parse(origin.trim()) {
        Ok(url) if url.host().is_some() => url.origin().ascii_serialization(),
        _ => origin.trim().trim_end_matches('/').to_ascii_lowercase(),
    }
}

/// What the gate decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Hand the request to the route.
    Proceed,
    /// Answer the preflight directly.
    Preflight { origin_allowed: bool },
    /// Origin missing or not on the allow-list.
    RejectOrigin,
    /// Origin is fine but the verb is not supported.
    RejectMethod,
}

/// Origin allow-list plus the single verb gated routes accept.
#[derive(Debug, Clone)]
pub struct AccessGate {
    origins: AllowedOrigins,
    method: Method,
}

impl AccessGate {
    #[must_use]
    pub const fn new(origins: AllowedOrigins, method: Method) -> Self {
        Self { origins, method }
    }

    /// Decide what to do with a request given its method and `Origin`.
    #[must_use]
    pub fn decide(&self, method: &Method, origin: Option<&str>) -> GateDecision {
        let origin_allowed = origin.is_some_and(|o| self.origins.allows(o));

        if *method == Method::OPTIONS {
            GateDecision::Preflight { origin_allowed }
        } else if !origin_allowed {
            GateDecision::RejectOrigin
        } else if *method != self.method {
            GateDecision::RejectMethod
        } else {
            GateDecision::Proceed
        }
    }
}

/// Attach access-control headers naming exactly `origin`.
fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
    );
}

/// Gate a request by origin and method.
///
/// Apply with `axum::middleware::from_fn_with_state` on the router holding
/// the gated routes.
pub async fn access_gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    let origin_str = origin.as_ref().and_then(|value| value.to_str().ok());
    let decision = state.gate().decide(request.method(), origin_str);

    tracing::debug!(
        method = %request.method(),
        origin = origin_str.unwrap_or("<none>"),
        ?decision,
        "access gate"
    );

    let mut response = match decision {
        GateDecision::Preflight { .. } => StatusCode::NO_CONTENT.into_response(),
        GateDecision::RejectOrigin => {
            tracing::warn!(origin = origin_str.unwrap_or("<none>"), "origin rejected");
            AppError::OriginRejected(origin_str.map(String::from)).into_response()
        }
        GateDecision::RejectMethod => AppError::MethodNotAllowed.into_response(),
        GateDecision::Proceed => next.run(request).await,
    };

    let headers = response.headers_mut();
    headers.append(VARY, HeaderValue::from_static("Origin"));

    let origin_allowed = matches!(
        decision,
        GateDecision::Proceed
            | GateDecision::RejectMethod
            | GateDecision::Preflight {
                origin_allowed: true
            }
    );
    if let Some(origin) = origin.filter(|_| origin_allowed) {
        apply_cors_headers(headers, origin);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        let origins =
            AllowedOrigins::parse("https://shop.example, https://www.shop.example/").unwrap();
        AccessGate::new(origins, Method::POST)
    }

    #[test]
    fn test_parse_normalizes_origins() {
        let origins = AllowedOrigins::parse("https://Shop.Example/, http://localhost:5173").unwrap();
        let listed: Vec<_> = origins.iter().collect();
        assert_eq!(listed, vec!["https://shop.example", "http://localhost:5173"]);
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        assert!(matches!(AllowedOrigins::parse(" , "), Err(OriginError::Empty)));
    }

    #[test]
    fn test_parse_rejects_non_http_origin() {
        assert!(matches!(
            AllowedOrigins::parse("ftp://shop.example"),
            Err(OriginError::Invalid { .. })
        ));
        assert!(AllowedOrigins::parse("not a url").is_err());
    }

    #[test]
    fn test_allows_ignores_case_and_trailing_slash() {
        let origins = AllowedOrigins::parse("https://shop.example").unwrap();
        assert!(origins.allows("https://SHOP.example/"));
        assert!(!origins.allows("https://shop.example.evil.test"));
        assert!(!origins.allows("http://shop.example"));
        assert!(!origins.allows("null"));
    }

    #[test]
    fn test_preflight_is_answered_for_any_origin() {
        let gate = gate();
        assert_eq!(
            gate.decide(&Method::OPTIONS, Some("https://shop.example")),
            GateDecision::Preflight {
                origin_allowed: true
            }
        );
        assert_eq!(
            gate.decide(&Method::OPTIONS, Some("https://evil.test")),
            GateDecision::Preflight {
                origin_allowed: false
            }
        );
    }

    #[test]
    fn test_origin_is_checked_before_method() {
        let gate = gate();
        assert_eq!(
            gate.decide(&Method::GET, Some("https://evil.test")),
            GateDecision::RejectOrigin
        );
        assert_eq!(gate.decide(&Method::POST, None), GateDecision::RejectOrigin);
    }

    #[test]
    fn test_wrong_method_from_allowed_origin() {
        let gate = gate();
        assert_eq!(
            gate.decide(&Method::GET, Some("https://www.shop.example")),
            GateDecision::RejectMethod
        );
    }

    #[test]
    fn test_post_from_allowed_origin_proceeds() {
        assert_eq!(
            gate().decide(&Method::POST, Some("https://shop.example")),
            GateDecision::Proceed
        );
    }

    #[tokio::test]
    async fn test_vary_origin_is_added_to_handler_vary() {
        use std::time::Duration;

        use axum::{Router, body::Body, middleware, routing::post};
        use tower::ServiceExt;

        use crate::config::{ClaudeConfig, GatewayConfig};

        let config = GatewayConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            allowed_origins: AllowedOrigins::parse("https://shop.example").unwrap(),
            upstream_timeout: Duration::from_secs(1),
            shopify: None,
            claude: ClaudeConfig {
                api_key: None,
                model: "claude-3-sonnet-20240229".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(&config, None, None);
        let app = Router::new()
            .route("/", post(|| async { ([(VARY, "Accept-Encoding")], "ok") }))
            .layer(middleware::from_fn_with_state(state.clone(), access_gate_middleware))
            .with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(ORIGIN, "https://shop.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let vary: Vec<_> = response
            .headers()
            .get_all(VARY)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(vary, vec!["Accept-Encoding", "Origin"]);
    }
}
