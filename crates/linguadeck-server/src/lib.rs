//! Linguadeck Review API
//!
//! Thin HTTP layer over the review engine in `linguadeck-core`. Exposes the
//! due-card query, review application, per-user summary, and record lookup.
//! Authentication and card content validation happen upstream; this service
//! trusts identifiers as opaque keys.

pub mod routes;
pub mod state;
