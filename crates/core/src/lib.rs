//! Storefront Gateway Core - Shared types library.
//!
//! This crate provides the types shared by the gateway components:
//! - `gateway` - HTTP gateway in front of Shopify and Claude
//! - `cli` - Command-line order lookups
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! here is pure parsing and normalization so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Order numbers, customer emails, and fulfillment states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
