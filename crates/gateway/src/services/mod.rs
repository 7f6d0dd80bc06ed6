//! Business logic between routes and upstream clients.

pub mod tracking;

pub use tracking::{LookupError, OrderResolver, ResolvedTracking, TrackingLookup, TrackingReply};
