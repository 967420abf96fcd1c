//! Driving Ports (API - Inbound)

use crate::error::SessionResult;
use shared_types::{KVStoreError, KeyValueRead, SessionId};

/// Session resolved for the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: SessionId,
    /// `true` when a new identifier was issued for this request.
    pub issued: bool,
}

/// Primary Session Identity API
///
/// Every operation fails closed with a storage error when the durable store
/// is unreachable; no identifier is ever handed out without its record
/// having been persisted first.
pub trait SessionApi: Send + Sync {
    /// Resolve the identifier presented by the client, issuing a new session
    /// when it is absent, malformed, unknown, retired or expired.
    fn ensure_session(&self, presented: Option<&str>) -> SessionResult<SessionHandle>;

    /// Rotate the identifier if the regeneration interval has elapsed.
    /// Returns the identifier to use from now on.
    fn maybe_regenerate(&self, id: &SessionId) -> SessionResult<SessionId>;

    /// Evict the session record and retire its identifier. Cart lines are
    /// left in place.
    fn destroy(&self, id: &SessionId) -> SessionResult<()>;

    /// Record activity on a live session.
    fn touch(&self, id: &SessionId) -> SessionResult<()>;

    /// Delete every idle-expired session record. Returns how many.
    fn purge_expired(&self) -> SessionResult<usize>;

    /// Whether `id` names an unexpired session, as seen through `view`.
    ///
    /// Lets another subsystem's transaction judge liveness without reading
    /// outside its own view.
    fn is_live_in(&self, view: &dyn KeyValueRead, id: &SessionId) -> Result<bool, KVStoreError>;
}
