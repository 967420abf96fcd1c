//! Persisted session record and the forgery token slot it carries.

use serde::{Deserialize, Serialize};
use shared_types::{constant_time_compare, generate_token_hex, redact, SessionId, Timestamp};
use std::fmt;

/// Random bytes behind a forgery token (256 bits).
pub const FORGERY_TOKEN_BYTES: usize = 32;

/// Anti-forgery secret bound to one session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForgeryToken(String);

impl ForgeryToken {
    pub fn generate() -> Self {
        Self(generate_token_hex(FORGERY_TOKEN_BYTES))
    }

    /// Full token value. Only ever sent back to the owning client.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against an untrusted candidate.
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_compare(&self.0, candidate)
    }
}

impl fmt::Debug for ForgeryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForgeryToken({})", redact(&self.0))
    }
}

/// Forgery token state stored in the session.
///
/// ```text
/// NoToken ──issue──→ Issued ──consume──→ Consumed ──issue──→ Issued ...
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenSlot {
    #[default]
    NoToken,
    Issued(ForgeryToken),
    Consumed,
}

impl TokenSlot {
    pub fn live_token(&self) -> Option<&ForgeryToken> {
        match self {
            TokenSlot::Issued(token) => Some(token),
            TokenSlot::NoToken | TokenSlot::Consumed => None,
        }
    }
}

/// Server-side session record, keyed by `session:{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub created_at: Timestamp,
    pub last_regenerated_at: Timestamp,
    pub last_seen_at: Timestamp,
    pub token: TokenSlot,
}

impl SessionRecord {
    /// A brand-new session issued at `now`.
    pub fn issued(id: SessionId, now: Timestamp) -> Self {
        Self {
            id,
            created_at: now,
            last_regenerated_at: now,
            last_seen_at: now,
            token: TokenSlot::NoToken,
        }
    }

    /// The same visitor under a new identifier.
    ///
    /// Keeps `created_at` and the token slot; resets the regeneration clock.
    pub fn regenerated(&self, new_id: SessionId, now: Timestamp) -> Self {
        Self {
            id: new_id,
            created_at: self.created_at,
            last_regenerated_at: now,
            last_seen_at: now,
            token: self.token.clone(),
        }
    }
}
