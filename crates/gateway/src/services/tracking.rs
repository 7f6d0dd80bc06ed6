//! Order tracking resolution.
//!
//! Given an order number and the email it was placed with, find the order in
//! Shopify and reduce it to a [`ResolvedTracking`]:
//!
//! 1. Search by marked name (`#1001`) and email, `status=any`.
//! 2. If Shopify answered but nothing matched, search by email alone and pick
//!    the first order whose bare name equals the requested one. Shopify's
//!    `name` filter is not reliable across API versions, so this second
//!    search catches orders the first one missed.
//! 3. A non-success answer from Shopify ends the lookup with that answer;
//!    the fallback would fail the same way.
//!
//! The two searches are sequential and nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use storefront_gateway_core::types::order_number::strip_marker;
use storefront_gateway_core::{Email, FulfillmentState, OrderNumber};
use thiserror::Error;
use tracing::instrument;

use crate::error::AppError;
use crate::shopify::{OrderSearch, OrderStore, ShopifyError, UpstreamOrder};

/// Shown in place of a tracking link when no fulfillment carries one.
pub const NO_TRACKING: &str = "No tracking available";

/// Upstream status assumed when neither the order nor its fulfillments say.
const DEFAULT_UPSTREAM_STATUS: &str = "unfulfilled";

/// Errors from an order lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Neither search produced a matching order.
    #[error("no order {0} for this email")]
    NotFound(OrderNumber),

    #[error(transparent)]
    Store(#[from] ShopifyError),
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(_) => Self::NotFound("Order not found".to_string()),
            LookupError::Store(e) => Self::Shopify(e),
        }
    }
}

/// A validated tracking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingLookup {
    pub order_number: OrderNumber,
    pub email: Email,
}

/// Which search found the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    NameAndEmail,
    EmailFallback,
}

/// Tracking details for one order, independent of Shopify's field layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTracking {
    /// Bare order name, e.g. `104276`.
    pub order_name: String,
    pub state: FulfillmentState,
    pub tracking_url: Option<String>,
    pub status_url: Option<String>,
    pub matched_by: MatchedBy,
}

impl ResolvedTracking {
    /// Reduce an upstream order to tracking details.
    ///
    /// `requested` names the order when Shopify left the name out.
    #[must_use]
    pub fn from_order(order: &UpstreamOrder, requested: &OrderNumber, matched_by: MatchedBy) -> Self {
        let first = order.fulfillments.first();

        let status = order
            .fulfillment_status()
            .or_else(|| first.and_then(|f| f.status()))
            .unwrap_or(DEFAULT_UPSTREAM_STATUS);

        let order_name = order
            .name()
            .map_or(requested.bare(), strip_marker)
            .to_string();

        Self {
            order_name,
            state: FulfillmentState::from_upstream(status),
            tracking_url: first.and_then(|f| f.tracking_link()).map(String::from),
            status_url: order.order_status_url().map(String::from),
            matched_by,
        }
    }

    #[must_use]
    pub const fn fulfilled(&self) -> bool {
        self.state.is_fulfilled()
    }
}

/// JSON body returned to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingReply {
    pub order_name: String,
    pub status: FulfillmentState,
    pub tracking: String,
    pub status_url: String,
    pub message: String,
}

/// Resolves tracking lookups against an [`OrderStore`].
#[derive(Clone)]
pub struct OrderResolver {
    store: Arc<dyn OrderStore>,
    status_page_url: String,
}

impl OrderResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    ///
    /// * `store` - Where orders are searched
    /// * `status_page_url` - Linked in replies for orders without their own status page
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, status_page_url: impl Into<String>) -> Self {
        Self {
            store,
            status_page_url: status_page_url.into(),
        }
    }

    /// Find the order and reduce it to tracking details.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Store`] if either search fails at the transport
    /// level or Shopify answers with a non-success status, and
    /// [`LookupError::NotFound`] if both searches come back without a match.
    #[instrument(
        skip(self, lookup),
        fields(order = %lookup.order_number, email = %lookup.email.redacted())
    )]
    pub async fn resolve(&self, lookup: &TrackingLookup) -> Result<ResolvedTracking, LookupError> {
        let requested = &lookup.order_number;

        let primary = self
            .store
            .search_orders(&OrderSearch::by_name_and_email(
                requested.marked(),
                lookup.email.clone(),
            ))
            .await?;

        let candidates = primary.into_orders();
        if let Some(order) = candidates
            .iter()
            .find(|order| order.name().is_none_or(|name| requested.matches_name(name)))
        {
            tracing::info!("Order matched by name and email");
            return Ok(ResolvedTracking::from_order(order, requested, MatchedBy::NameAndEmail));
        }

        tracing::debug!("No match by name, searching by email");
        let fallback = self
            .store
            .search_orders(&OrderSearch::by_email(lookup.email.clone()))
            .await?;

        let candidates = fallback.into_orders();
        candidates
            .iter()
            .find(|order| order.name().is_some_and(|name| requested.matches_name(name)))
            .map(|order| {
                tracing::info!("Order matched by email fallback");
                ResolvedTracking::from_order(order, requested, MatchedBy::EmailFallback)
            })
            .ok_or_else(|| {
                tracing::info!("Order not found");
                LookupError::NotFound(requested.clone())
            })
    }

    /// Render tracking details as the storefront reply.
    #[must_use]
    pub fn reply(&self, resolved: ResolvedTracking) -> TrackingReply {
        let tracking = resolved
            .tracking_url
            .unwrap_or_else(|| NO_TRACKING.to_string());
        let status_url = resolved
            .status_url
            .unwrap_or_else(|| self.status_page_url.clone());
        let message = format!(
            "Order #{} is {}. Tracking: {tracking}. You can follow your order at {status_url}.",
            resolved.order_name,
            resolved.state.describe(),
        );

        TrackingReply {
            order_name: resolved.order_name,
            status: resolved.state,
            tracking,
            status_url,
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::shopify::OrderSearchResult;

    const STATUS_PAGE: &str = "https://shop.example/account/orders";

    /// Store that replays scripted answers and records every search.
    struct ScriptedStore {
        answers: Mutex<VecDeque<Result<OrderSearchResult, ShopifyError>>>,
        searches: Mutex<Vec<OrderSearch>>,
    }

    impl ScriptedStore {
        fn answering(answers: Vec<Result<OrderSearchResult, ShopifyError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                searches: Mutex::default(),
            })
        }

        fn searches(&self) -> Vec<OrderSearch> {
            self.searches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderStore for ScriptedStore {
        async fn search_orders(
            &self,
            search: &OrderSearch,
        ) -> Result<OrderSearchResult, ShopifyError> {
            self.searches.lock().unwrap().push(search.clone());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(OrderSearchResult::Orders(Vec::new())))
        }
    }

    fn orders(body: &str) -> Result<OrderSearchResult, ShopifyError> {
        Ok(OrderSearchResult::from_body(body))
    }

    fn lookup(number: &str) -> TrackingLookup {
        TrackingLookup {
            order_number: OrderNumber::parse(number).unwrap(),
            email: Email::parse("a@b.com").unwrap(),
        }
    }

    fn resolver(store: Arc<ScriptedStore>) -> OrderResolver {
        OrderResolver::new(store, STATUS_PAGE)
    }

    #[tokio::test]
    async fn test_primary_match_skips_fallback() {
        let store = ScriptedStore::answering(vec![orders(
            r##"{"orders":[{"name":"#104276","fulfillment_status":"fulfilled","fulfillments":[{"tracking_url":"http://t"}]}]}"##,
        )]);

        let resolved = resolver(store.clone()).resolve(&lookup("104276")).await.unwrap();

        assert_eq!(resolved.order_name, "104276");
        assert!(resolved.fulfilled());
        assert_eq!(resolved.tracking_url.as_deref(), Some("http://t"));
        assert_eq!(resolved.matched_by, MatchedBy::NameAndEmail);

        let searches = store.searches();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].name.as_deref(), Some("#104276"));
        assert_eq!(searches[0].email.as_str(), "a@b.com");
    }

    #[tokio::test]
    async fn test_empty_primary_uses_email_fallback() {
        let store = ScriptedStore::answering(vec![
            orders(r#"{"orders":[]}"#),
            orders(
                r##"{"orders":[
                    {"name":"#100001","fulfillment_status":null},
                    {"name":"#104276","fulfillment_status":"fulfilled","fulfillments":[{"tracking_url":"http://t"}]}
                ]}"##,
            ),
        ]);

        let resolved = resolver(store.clone()).resolve(&lookup("#104276")).await.unwrap();

        assert_eq!(resolved.order_name, "104276");
        assert_eq!(resolved.state, FulfillmentState::Fulfilled);
        assert_eq!(resolved.tracking_url.as_deref(), Some("http://t"));
        assert_eq!(resolved.matched_by, MatchedBy::EmailFallback);

        let searches = store.searches();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[1].name, None);
    }

    #[tokio::test]
    async fn test_primary_with_wrong_names_falls_back() {
        let store = ScriptedStore::answering(vec![
            orders(r##"{"orders":[{"name":"#999"}]}"##),
            orders(r#"{"orders":[]}"#),
        ]);

        let err = resolver(store.clone()).resolve(&lookup("104276")).await.unwrap_err();

        assert!(matches!(err, LookupError::NotFound(_)));
        assert_eq!(store.searches().len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_primary_falls_back() {
        let store = ScriptedStore::answering(vec![
            orders("<html>oops</html>"),
            orders(r##"{"orders":[{"name":"#104276"}]}"##),
        ]);

        let resolved = resolver(store.clone()).resolve(&lookup("104276")).await.unwrap();

        assert_eq!(resolved.matched_by, MatchedBy::EmailFallback);
        assert_eq!(resolved.state, FulfillmentState::Unfulfilled);
    }

    #[tokio::test]
    async fn test_both_searches_empty_is_not_found() {
        let store = ScriptedStore::answering(vec![
            orders(r#"{"orders":[]}"#),
            orders(r#"{"orders":[]}"#),
        ]);

        let err = resolver(store).resolve(&lookup("104276")).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(ref n) if n.bare() == "104276"));
    }

    #[tokio::test]
    async fn test_primary_api_error_skips_fallback() {
        let store = ScriptedStore::answering(vec![Err(ShopifyError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: "Invalid API key or access token".to_string(),
        })]);

        let err = resolver(store.clone()).resolve(&lookup("104276")).await.unwrap_err();

        match err {
            LookupError::Store(e) => assert_eq!(e.upstream_status(), Some(StatusCode::UNAUTHORIZED)),
            LookupError::NotFound(_) => panic!("expected store error"),
        }
        assert_eq!(store.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_api_error_is_surfaced() {
        let store = ScriptedStore::answering(vec![
            orders(r#"{"orders":[]}"#),
            Err(ShopifyError::Api {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: "Exceeded 2 calls per second".to_string(),
            }),
        ]);

        let err = resolver(store).resolve(&lookup("104276")).await.unwrap_err();
        assert!(matches!(err, LookupError::Store(ShopifyError::Api { status, .. }) if status == StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_nameless_primary_order_uses_requested_name() {
        let store = ScriptedStore::answering(vec![orders(r#"{"orders":[{"name":null}]}"#)]);

        let resolved = resolver(store).resolve(&lookup("#104276")).await.unwrap();
        assert_eq!(resolved.order_name, "104276");
    }

    #[test]
    fn test_status_falls_back_to_first_fulfillment() {
        let order: UpstreamOrder = serde_json::from_str(
            r##"{"name":"#1","fulfillment_status":null,"fulfillments":[{"status":"Fulfilled"},{"status":"pending"}]}"##,
        )
        .unwrap();
        let resolved =
            ResolvedTracking::from_order(&order, &OrderNumber::parse("1").unwrap(), MatchedBy::NameAndEmail);
        assert!(resolved.fulfilled());
    }

    #[test]
    fn test_other_status_is_passed_through() {
        let order: UpstreamOrder =
            serde_json::from_str(r##"{"name":"#1","fulfillment_status":"partial"}"##).unwrap();
        let resolved =
            ResolvedTracking::from_order(&order, &OrderNumber::parse("1").unwrap(), MatchedBy::NameAndEmail);
        assert_eq!(resolved.state, FulfillmentState::Other("partial".to_string()));
        assert!(!resolved.fulfilled());
    }

    #[test]
    fn test_tracking_uses_url_list_when_direct_url_missing() {
        let order: UpstreamOrder = serde_json::from_str(
            r##"{"name":"#1","fulfillments":[{"tracking_url":null,"tracking_urls":["http://list"]}]}"##,
        )
        .unwrap();
        let resolved =
            ResolvedTracking::from_order(&order, &OrderNumber::parse("1").unwrap(), MatchedBy::NameAndEmail);
        assert_eq!(resolved.tracking_url.as_deref(), Some("http://list"));
    }

    #[test]
    fn test_reply_defaults() {
        let resolver = resolver(ScriptedStore::answering(Vec::new()));
        let reply = resolver.reply(ResolvedTracking {
            order_name: "104276".to_string(),
            state: FulfillmentState::Unfulfilled,
            tracking_url: None,
            status_url: None,
            matched_by: MatchedBy::NameAndEmail,
        });

        assert_eq!(reply.tracking, NO_TRACKING);
        assert_eq!(reply.status_url, STATUS_PAGE);
        assert_eq!(
            reply.message,
            format!(
                "Order #104276 is not fulfilled yet. Tracking: No tracking available. You can follow your order at {STATUS_PAGE}."
            )
        );
    }

    #[test]
    fn test_reply_prefers_order_status_url() {
        let resolver = resolver(ScriptedStore::answering(Vec::new()));
        let reply = resolver.reply(ResolvedTracking {
            order_name: "104276".to_string(),
            state: FulfillmentState::Fulfilled,
            tracking_url: Some("http://t".to_string()),
            status_url: Some("https://shop.example/orders/abc".to_string()),
            matched_by: MatchedBy::EmailFallback,
        });

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["order_name"], "104276");
        assert_eq!(json["status"], "fulfilled");
        assert_eq!(json["tracking"], "http://t");
        assert_eq!(json["status_url"], "https://shop.example/orders/abc");
    }
}
