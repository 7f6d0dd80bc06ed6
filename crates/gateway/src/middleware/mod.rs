//! HTTP middleware stack for the gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (echo or generate `x-request-id`)
//! 4. Access gate (storefront API routes only)

pub mod access_gate;
pub mod request_id;

pub use access_gate::{AccessGate, AllowedOrigins, GateDecision, access_gate_middleware};
pub use request_id::request_id_middleware;
