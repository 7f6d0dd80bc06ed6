//! Order tracking route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use storefront_gateway_core::{Email, OrderNumber};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::{TrackingLookup, TrackingReply};
use crate::state::AppState;

const MISSING_FIELDS: &str = "Missing order number or email";

/// Tracking form data posted by the storefront.
///
/// `orderNumber` may arrive as a string or, from some themes, as a number.
#[derive(Debug, Default, Deserialize)]
pub struct TrackOrderRequest {
    #[serde(default, rename = "orderNumber", alias = "order_number")]
    pub order_number: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TrackOrderRequest {
    /// Validate the form into a lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if either field is missing or blank,
    /// or does not parse.
    pub fn into_lookup(self) -> Result<TrackingLookup> {
        let order_number = match self.order_number {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
        .filter(|s| !s.trim().is_empty());
        let email = self.email.filter(|s| !s.trim().is_empty());

        let (Some(order_number), Some(email)) = (order_number, email) else {
            return Err(AppError::BadRequest(MISSING_FIELDS.to_string()));
        };

        Ok(TrackingLookup {
            order_number: OrderNumber::parse(&order_number)
                .map_err(|e| AppError::BadRequest(format!("Invalid order number: {e}")))?,
            email: Email::parse(&email)
                .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?,
        })
    }
}

/// Look up an order's fulfillment and tracking.
///
/// POST /api/track-order
///
/// Responds 200 with the tracking reply, 400 for missing fields, 404 when no
/// order matches, 500 when Shopify is not configured, or Shopify's own status
/// when it rejects the search.
#[instrument(skip_all)]
pub async fn track_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TrackOrderRequest>, JsonRejection>,
) -> Result<Json<TrackingReply>> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected tracking body");
        AppError::BadRequest(MISSING_FIELDS.to_string())
    })?;
    let lookup = request.into_lookup()?;

    let resolver = state.orders().ok_or_else(|| {
        AppError::ConfigurationMissing("Order lookup is not configured".to_string())
    })?;

    let resolved = resolver.resolve(&lookup).await?;
    Ok(Json(resolver.reply(resolved)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> TrackOrderRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_lookup_normalizes_fields() {
        let lookup = request(r#"{"orderNumber":" 104276 ","email":" a@b.com "}"#)
            .into_lookup()
            .unwrap();
        assert_eq!(lookup.order_number.marked(), "#104276");
        assert_eq!(lookup.email.as_str(), "a@b.com");
    }

    #[test]
    fn test_into_lookup_accepts_numeric_order_number() {
        let lookup = request(r#"{"orderNumber":104276,"email":"a@b.com"}"#)
            .into_lookup()
            .unwrap();
        assert_eq!(lookup.order_number.bare(), "104276");
    }

    #[test]
    fn test_into_lookup_accepts_snake_case_alias() {
        let lookup = request(r##"{"order_number":"#1001","email":"a@b.com"}"##)
            .into_lookup()
            .unwrap();
        assert_eq!(lookup.order_number.bare(), "1001");
    }

    #[test]
    fn test_into_lookup_missing_fields() {
        for json in [
            r#"{"email":"a@b.com"}"#,
            r#"{"orderNumber":"1001"}"#,
            r#"{"orderNumber":"1001","email":"   "}"#,
            r#"{"orderNumber":"","email":"a@b.com"}"#,
            r#"{"orderNumber":null,"email":"a@b.com"}"#,
        ] {
            let err = request(json).into_lookup().unwrap_err();
            assert!(
                matches!(err, AppError::BadRequest(ref m) if m == MISSING_FIELDS),
                "{json} gave {err}"
            );
        }
    }

    #[test]
    fn test_into_lookup_invalid_email() {
        let err = request(r#"{"orderNumber":"1001","email":"nobody"}"#)
            .into_lookup()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.starts_with("Invalid email")));
    }
}
