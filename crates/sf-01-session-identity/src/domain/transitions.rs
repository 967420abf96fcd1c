//! Session state transitions expressed as batches.
//!
//! Each step reads through a transaction view and returns the operations to
//! apply, so callers (this crate and the forgery guard) can compose several
//! steps into one atomic unit.
//!
//! ## Regeneration
//!
//! ```text
//! session:{old}            ──delete──→
//! session-retired:{old}    ←──put────  (never reissued)
//! session:{new}            ←──put────  (created_at kept, token slot kept)
//! cart:{old}:{p} (each)    ──delete──→ cart:{new}:{p} ←──put──
//! ```
//!
//! All of it lands in one batch; a partial repartition cannot be observed.

use super::policy::SessionPolicy;
use super::record::SessionRecord;
use crate::error::{SessionError, SessionResult};
use shared_types::{
    decode_record, encode_record, BatchOperation, CartLine, KVStoreError, KeyPrefix,
    KeyValueRead, SessionId, Timestamp,
};

/// Identifier draws before giving up. A collision on 256 random bits means
/// the entropy source is broken.
pub const MAX_ID_ATTEMPTS: usize = 4;

/// Outcome of looking up a presented identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Live(SessionRecord),
    Expired(SessionRecord),
    Absent,
}

pub fn load_record(
    view: &dyn KeyValueRead,
    id: &SessionId,
) -> Result<Option<SessionRecord>, KVStoreError> {
    view.get(&KeyPrefix::session(id))?
        .map(|bytes| decode_record(&bytes))
        .transpose()
}

pub fn lookup(
    view: &dyn KeyValueRead,
    id: &SessionId,
    policy: &SessionPolicy,
    now: Timestamp,
) -> Result<Lookup, KVStoreError> {
    Ok(match load_record(view, id)? {
        Some(record) if policy.is_expired(&record, now) => Lookup::Expired(record),
        Some(record) => Lookup::Live(record),
        None => Lookup::Absent,
    })
}

pub fn put_record(record: &SessionRecord) -> Result<BatchOperation, KVStoreError> {
    Ok(BatchOperation::put(
        KeyPrefix::session(&record.id),
        encode_record(record)?,
    ))
}

/// Evict the record and mark the identifier as never reusable.
pub fn retire(id: &SessionId, now: Timestamp) -> Result<Vec<BatchOperation>, KVStoreError> {
    Ok(vec![
        BatchOperation::delete(KeyPrefix::session(id)),
        BatchOperation::put(KeyPrefix::retired_session(id), encode_record(&now)?),
    ])
}

/// Draw an identifier that is neither live nor retired.
pub fn unused_id(view: &dyn KeyValueRead) -> SessionResult<SessionId> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = SessionId::generate();
        let live = view.get(&KeyPrefix::session(&candidate))?.is_some();
        let retired = view.get(&KeyPrefix::retired_session(&candidate))?.is_some();
        if !live && !retired {
            return Ok(candidate);
        }
    }
    Err(SessionError::IdentifierExhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}

/// Issue a brand-new session.
pub fn issue(
    view: &dyn KeyValueRead,
    now: Timestamp,
) -> SessionResult<(SessionRecord, BatchOperation)> {
    let record = SessionRecord::issued(unused_id(view)?, now);
    let op = put_record(&record)?;
    Ok((record, op))
}

/// Planned regeneration of one session.
#[derive(Debug)]
pub struct Regeneration {
    pub record: SessionRecord,
    pub operations: Vec<BatchOperation>,
    pub moved_lines: usize,
}

/// Move `current` (as stored, or as about to be stored) to a fresh id and
/// re-key every cart line it owns.
pub fn regenerate(
    view: &dyn KeyValueRead,
    current: &SessionRecord,
    now: Timestamp,
) -> SessionResult<Regeneration> {
    let record = current.regenerated(unused_id(view)?, now);

    let mut operations = retire(&current.id, now)?;
    operations.push(put_record(&record)?);

    let lines = view.prefix_scan(&KeyPrefix::cart_of(&current.id))?;
    let moved_lines = lines.len();
    for (old_key, bytes) in lines {
        let mut line: CartLine = decode_record(&bytes)?;
        line.session_id = record.id.clone();
        operations.push(BatchOperation::delete(old_key));
        operations.push(BatchOperation::put(
            KeyPrefix::cart_line(&record.id, line.product_id),
            encode_record(&line)?,
        ));
    }

    Ok(Regeneration {
        record,
        operations,
        moved_lines,
    })
}
