//! Middleware stack for the storefront gateway.
//!
//! Layer order: Request → Tracing → BodyLimit → Cors → RateLimit (mutations) → Handler

pub mod cors;
pub mod rate_limit;
pub mod tracing;

pub use cors::create_cors_layer;
pub use rate_limit::{is_mutation, RateLimitLayer, RateLimitState};
pub use tracing::{TracingLayer, REQUEST_ID_HEADER};
