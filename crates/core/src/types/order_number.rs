//! Customer-facing order number.
//!
//! Shopify names orders `#1001`, `#1002`, ... while customers type them with
//! or without the `#`. [`OrderNumber`] keeps the bare form and renders the
//! marked form on demand, so both spellings compare equal.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Leading marker Shopify puts in front of order names.
pub const ORDER_NAME_MARKER: char = '#';

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Nothing left once whitespace and markers are removed.
    #[error("order number cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("order number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace between characters.
    #[error("order number cannot contain whitespace")]
    ContainsWhitespace,
}

/// A normalized order number.
///
/// ## Examples
///
/// ```
/// use storefront_gateway_core::OrderNumber;
///
/// let plain = OrderNumber::parse("104276").unwrap();
/// let marked = OrderNumber::parse("#104276").unwrap();
///
/// assert_eq!(plain, marked);
/// assert_eq!(plain.bare(), "104276");
/// assert_eq!(plain.marked(), "#104276");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    bare: String,
}

impl OrderNumber {
    /// Maximum length of the bare form.
    pub const MAX_LENGTH: usize = 64;

    /// Parse an `OrderNumber` from customer input.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing remains after trimming whitespace and
    /// leading `#` markers, if the remainder is longer than 64 characters,
    /// or if it contains inner whitespace.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let bare = strip_marker(s);

        if bare.is_empty() {
            return Err(OrderNumberError::Empty);
        }

        if bare.len() > Self::MAX_LENGTH {
            return Err(OrderNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if bare.chars().any(char::is_whitespace) {
            return Err(OrderNumberError::ContainsWhitespace);
        }

        Ok(Self {
            bare: bare.to_owned(),
        })
    }

    /// The order number without its marker, e.g. `104276`.
    #[must_use]
    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// The order number as Shopify names it, e.g. `#104276`.
    #[must_use]
    pub fn marked(&self) -> String {
        format!("{ORDER_NAME_MARKER}{}", self.bare)
    }

    /// Whether an upstream order name refers to this order number.
    ///
    /// The upstream name is compared in its bare form, so `#104276` and
    /// `104276` both match.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        strip_marker(name) == self.bare
    }
}

/// Strip surrounding whitespace and any leading `#` markers.
#[must_use]
pub fn strip_marker(s: &str) -> &str {
    s.trim().trim_start_matches(ORDER_NAME_MARKER).trim_start()
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ORDER_NAME_MARKER}{}", self.bare)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.marked()
    }
}
