//! Driving Ports (API - Inbound)

use crate::error::{ForgeryError, ForgeryResult};
use sf_01_session_identity::ForgeryToken;
use shared_types::SessionId;

/// Result of validating a candidate token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    /// Token matched and was consumed. The session now lives under `session`.
    Accepted { session: SessionId },
    /// Nothing was changed.
    Rejected,
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted { .. })
    }
}

/// Primary Forgery-Token Guard API
pub trait ForgeryGuardApi: Send + Sync {
    /// Live token of the session, issuing one when none is live.
    ///
    /// Idempotent while the token stays unconsumed.
    fn issue_or_get(&self, session: &SessionId) -> ForgeryResult<ForgeryToken>;

    /// Compare `candidate` against the live token in constant time.
    ///
    /// On a match the token is consumed and the session regenerated in the
    /// same atomic unit. A missing candidate is a mismatch.
    fn validate_and_consume(
        &self,
        session: &SessionId,
        candidate: Option<&str>,
    ) -> ForgeryResult<Validation>;

    /// [`Self::validate_and_consume`], with rejection as an error.
    fn require(&self, session: &SessionId, candidate: Option<&str>) -> ForgeryResult<SessionId> {
        match self.validate_and_consume(session, candidate)? {
            Validation::Accepted { session } => Ok(session),
            Validation::Rejected => Err(ForgeryError::Mismatch),
        }
    }
}
