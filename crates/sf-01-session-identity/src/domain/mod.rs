//! Session domain: the persisted record, timing policy and the batch-level
//! transitions between session states.

pub mod policy;
pub mod record;
pub mod transitions;

pub use policy::SessionPolicy;
pub use record::{ForgeryToken, SessionRecord, TokenSlot, FORGERY_TOKEN_BYTES};
pub use transitions::{Lookup, Regeneration, MAX_ID_ATTEMPTS};
