//! Fulfillment state reported to the storefront.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order fulfillment state.
///
/// Shopify reports fulfillment as free-form strings that differ between the
/// order (`fulfilled`, `partial`, `restocked`, or `null`) and its fulfillment
/// records (`success`, `pending`, `cancelled`, ...). Only `fulfilled` and
/// `unfulfilled` are interpreted; any other value is passed through
/// lower-cased so the storefront can still display it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum FulfillmentState {
    Fulfilled,
    #[default]
    Unfulfilled,
    Other(String),
}

impl FulfillmentState {
    /// Interpret an upstream status string, case-insensitively.
    ///
    /// A blank string counts as unfulfilled.
    #[must_use]
    pub fn from_upstream(status: &str) -> Self {
        let status = status.trim().to_ascii_lowercase();
        match status.as_str() {
            "fulfilled" => Self::Fulfilled,
            "" | "unfulfilled" => Self::Unfulfilled,
            _ => Self::Other(status),
        }
    }

    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }

    /// The wire value, e.g. `fulfilled`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fulfilled => "fulfilled",
            Self::Unfulfilled => "unfulfilled",
            Self::Other(status) => status,
        }
    }

    /// Human-readable phrase for customer messages.
    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            Self::Fulfilled => "fulfilled",
            Self::Unfulfilled => "not fulfilled yet",
            Self::Other(status) => status,
        }
    }
}

impl fmt::Display for FulfillmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FulfillmentState {
    fn from(value: String) -> Self {
        Self::from_upstream(&value)
    }
}

impl From<FulfillmentState> for String {
    fn from(state: FulfillmentState) -> Self {
        state.as_str().to_owned()
    }
}
