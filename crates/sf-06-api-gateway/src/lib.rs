//! SF-06 API Gateway - HTTP surface of the storefront.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API GATEWAY (sf-06)                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────────────────────────┐                       │
//! │  │              Middleware Stack                │                       │
//! │  │  Tracing → BodyLimit → Cors → RateLimit      │                       │
//! │  └──────────────────────┬───────────────────────┘                       │
//! │                         │                                               │
//! │  ┌──────────────────────┴───────────────────────┐                       │
//! │  │             Request Dispatcher               │                       │
//! │  │  cookie → session → forgery token (POST)     │                       │
//! │  └──────────────────────┬───────────────────────┘                       │
//! │                         │  spawn_blocking                               │
//! └─────────────────────────┼───────────────────────────────────────────────┘
//!                           │
//!     ┌───────────────┬─────┴─────────┬────────────────┐
//!     ▼               ▼               ▼                ▼
//! sf-01-session  sf-02-forgery   sf-04-cart      sf-05-catalog
//! ```
//!
//! # Security
//!
//! - Session cookie is `HttpOnly`, `SameSite=Strict`, `Secure` unless disabled
//! - Every `POST` must carry the live forgery token (`csrf_token` field or
//!   `X-CSRF-Token` header); a mismatch is answered 403 with nothing written
//! - Per-IP token bucket on mutations, request body size limit
//! - Storage failures answer 503 without detail

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod dispatch;
pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

// Re-exports for public API
pub use dispatch::{RequestDispatcher, RequestSession};
pub use domain::config::StorefrontConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use domain::{CartForm, ConfigError, Payload, SessionCookie};
pub use router::{build_router, AppState};
pub use service::StorefrontGateway;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
