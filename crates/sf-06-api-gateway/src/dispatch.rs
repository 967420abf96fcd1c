//! Request dispatcher: resolves the session for every request and enforces
//! the forgery-token protocol before any mutation runs.
//!
//! ```text
//! read:      cookie ─→ ensure_session ─→ maybe_regenerate ─→ handler
//! mutation:  cookie ─→ parse ─→ validate_and_consume ─┬→ handler
//!                              (consume + regenerate) └→ 403, nothing written
//! ```
//!
//! A mutation never issues a session: without a live one it is refused.
//!
//! Synchronous; handlers run it on the blocking pool.

use crate::domain::error::{ApiError, ApiResult};
use sf_01_session_identity::{ForgeryToken, SessionApi};
use sf_02_forgery_guard::{ForgeryGuardApi, Validation};
use shared_types::SessionId;
use std::sync::Arc;

/// Session a request runs under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSession {
    pub id: SessionId,
    /// The client must be sent a new cookie.
    pub rotated: bool,
}

pub struct RequestDispatcher {
    sessions: Arc<dyn SessionApi>,
    guard: Arc<dyn ForgeryGuardApi>,
}

impl RequestDispatcher {
    pub fn new(sessions: Arc<dyn SessionApi>, guard: Arc<dyn ForgeryGuardApi>) -> Self {
        Self { sessions, guard }
    }

    /// Session for a read, rotated when the regeneration interval elapsed.
    pub fn resolve(&self, presented: Option<&str>) -> ApiResult<RequestSession> {
        let handle = self.sessions.ensure_session(presented)?;
        let id = self.sessions.maybe_regenerate(&handle.id)?;
        let rotated = handle.issued || id != handle.id;
        Ok(RequestSession { id, rotated })
    }

    /// Session for a mutation. The candidate token is consumed and the
    /// session regenerated. On mismatch, or when no live session is
    /// presented, nothing is written.
    pub fn authorize_mutation(
        &self,
        presented: Option<&str>,
        candidate: Option<&str>,
    ) -> ApiResult<RequestSession> {
        let Some(id) = presented.and_then(SessionId::parse) else {
            tracing::warn!(
                token_present = candidate.is_some(),
                "[sf-06] mutation refused: no session presented"
            );
            return Err(ApiError::forgery_mismatch());
        };
        match self.guard.validate_and_consume(&id, candidate)? {
            Validation::Accepted { session } => Ok(RequestSession {
                id: session,
                rotated: true,
            }),
            Validation::Rejected => {
                tracing::warn!(
                    session = %id.short(),
                    token_present = candidate.is_some(),
                    "[sf-06] mutation refused: forgery token mismatch"
                );
                Err(ApiError::forgery_mismatch())
            }
        }
    }

    /// Live token to embed in the response.
    pub fn token_for(&self, session: &SessionId) -> ApiResult<ForgeryToken> {
        Ok(self.guard.issue_or_get(session)?)
    }

    pub fn destroy(&self, session: &SessionId) -> ApiResult<()> {
        Ok(self.sessions.destroy(session)?)
    }
}
