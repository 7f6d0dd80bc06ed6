//! Wire types for the Admin REST `orders.json` endpoint.
//!
//! Only the fields order tracking reads are modelled. Every field is
//! optional and explicit `null`s are treated like missing fields, since
//! Shopify omits or nulls different fields across API versions.

use serde::{Deserialize, Deserializer};

/// Top-level `orders.json` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub orders: Vec<UpstreamOrder>,
}

/// An order as returned by the Admin REST API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamOrder {
    /// Order name, e.g. `#1001`.
    #[serde(default)]
    pub name: Option<String>,
    /// `fulfilled`, `partial`, `restocked`, or `null` when unfulfilled.
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    /// Customer-facing order status page.
    #[serde(default)]
    pub order_status_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fulfillments: Vec<FulfillmentRecord>,
}

/// A shipment recorded against an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FulfillmentRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracking_urls: Vec<String>,
}

impl UpstreamOrder {
    /// The order name, if Shopify sent a non-blank one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    #[must_use]
    pub fn fulfillment_status(&self) -> Option<&str> {
        non_blank(self.fulfillment_status.as_deref())
    }

    #[must_use]
    pub fn order_status_url(&self) -> Option<&str> {
        non_blank(self.order_status_url.as_deref())
    }
}

impl FulfillmentRecord {
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        non_blank(self.status.as_deref())
    }

    /// The first usable tracking link: `tracking_url`, then the first
    /// entry of `tracking_urls`.
    #[must_use]
    pub fn tracking_link(&self) -> Option<&str> {
        non_blank(self.tracking_url.as_deref())
            .or_else(|| non_blank(self.tracking_urls.first().map(String::as_str)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
