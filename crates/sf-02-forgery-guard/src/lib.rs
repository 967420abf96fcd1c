//! # sf-02-forgery-guard
//!
//! Single-use anti-forgery tokens bound to the visitor session.
//!
//! ## State Machine
//!
//! ```text
//! [NoToken] ──issue_or_get──→ [Issued] ──validate_and_consume (match)──→ [Consumed]
//!                              │   ↑                                         │
//!                  issue_or_get│   └──────────────issue_or_get───────────────┘
//!                  (same value)│
//!                              └──validate_and_consume (mismatch)──→ [Issued] (unchanged)
//! ```
//!
//! A successful consumption also regenerates the session identifier in the
//! same batch, so the next response carries both a new session and, once
//! requested, a new token.
//!
//! ## Security
//!
//! - Tokens carry 256 bits of OS entropy.
//! - Comparison is constant time.
//! - Validation is never retried; a rejected request performs no mutation.

pub mod error;
pub mod ports;
pub mod service;

pub use error::{ForgeryError, ForgeryResult};
pub use ports::inbound::{ForgeryGuardApi, Validation};
pub use service::ForgeryGuard;
pub use sf_01_session_identity::ForgeryToken;
