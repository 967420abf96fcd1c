//! # sf-01-session-identity
//!
//! Session Identity Manager: lifecycle of the anonymous visitor session whose
//! identifier partitions every cart line.
//!
//! ## Lifecycle
//!
//! ```text
//! (no cookie) ──ensure_session──→ [LIVE] ──maybe_regenerate (>30m)──→ [LIVE, new id]
//!                                   │  │                                  │
//!                                   │  └──idle > 1h──→ [EXPIRED] ──→ retired
//!                                   └──destroy──────────────────────→ retired
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Identifiers are unguessable | 256 bits of OS entropy |
//! | No identifier is ever reused | retired ids are kept and refused |
//! | Regeneration never splits a cart | record swap and cart re-key share one batch |
//! | No illusory sessions | ids are only returned once their record is stored |
//!
//! Cart lines of a destroyed session are left behind; removing them is the
//! job of the cart store's abandoned-cart hook.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{ForgeryToken, SessionPolicy, SessionRecord, TokenSlot};
pub use error::{SessionError, SessionResult};
pub use ports::inbound::{SessionApi, SessionHandle};
pub use service::SessionManager;
