//! Core types for the storefront gateway.
//!
//! This module provides type-safe wrappers for customer-supplied lookup input
//! and the normalized fulfillment state reported back to the storefront.

pub mod email;
pub mod order_number;
pub mod status;

pub use email::{Email, EmailError};
pub use order_number::{OrderNumber, OrderNumberError};
pub use status::FulfillmentState;
