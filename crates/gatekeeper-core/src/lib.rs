//! Shared web glue for gatekeeper services: health endpoints, tracing setup,
//! request-id middleware, identity extraction, pagination.

pub mod health;
pub mod identity;
pub mod middleware;
pub mod pagination;
pub mod serde;
pub mod tracing;
