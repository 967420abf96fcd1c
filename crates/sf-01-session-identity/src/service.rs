//! Session Identity Service - session lifecycle over the durable store

use crate::domain::transitions::{self, Lookup};
use crate::domain::{SessionPolicy, SessionRecord};
use crate::error::{SessionError, SessionResult};
use crate::ports::inbound::{SessionApi, SessionHandle};
use shared_types::{
    decode_record, transact_with, BatchOperation, KVStoreError, KeyPrefix, KeyValueRead,
    KeyValueStore, SessionId, TimeSource, Timestamp,
};
use std::sync::Arc;

/// Session Identity Manager.
///
/// Stateless apart from its collaborators; every request's view of a session
/// comes from the store.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Current record of a live session, if any.
    pub fn load(&self, id: &SessionId) -> SessionResult<Option<SessionRecord>> {
        let now = self.clock.now();
        let policy = self.policy;
        transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            let found = match transitions::lookup(view, id, &policy, now)? {
                Lookup::Live(record) => Some(record),
                Lookup::Expired(_) | Lookup::Absent => None,
            };
            Ok((Vec::new(), found))
        })
    }
}

impl SessionApi for SessionManager {
    fn ensure_session(&self, presented: Option<&str>) -> SessionResult<SessionHandle> {
        let now = self.clock.now();
        let policy = self.policy;
        let presented = presented.and_then(SessionId::parse);

        let handle = transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            let mut ops = Vec::new();
            if let Some(id) = &presented {
                match transitions::lookup(view, id, &policy, now)? {
                    Lookup::Live(mut record) => {
                        record.last_seen_at = now;
                        ops.push(transitions::put_record(&record)?);
                        return Ok((
                            ops,
                            SessionHandle {
                                id: record.id,
                                issued: false,
                            },
                        ));
                    }
                    Lookup::Expired(record) => {
                        ops.extend(transitions::retire(&record.id, now)?);
                    }
                    Lookup::Absent => {}
                }
            }
            let (record, put) = transitions::issue(view, now)?;
            ops.push(put);
            Ok((
                ops,
                SessionHandle {
                    id: record.id,
                    issued: true,
                },
            ))
        })?;

        if handle.issued {
            tracing::info!(session = %handle.id.short(), "[sf-01] session issued");
        }
        Ok(handle)
    }

    fn maybe_regenerate(&self, id: &SessionId) -> SessionResult<SessionId> {
        let now = self.clock.now();
        let policy = self.policy;

        let outcome = transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            let record = match transitions::lookup(view, id, &policy, now)? {
                Lookup::Live(record) => record,
                Lookup::Expired(_) | Lookup::Absent => {
                    return Err(SessionError::NotFound {
                        session: id.short(),
                    })
                }
            };
            if !policy.regeneration_due(&record, now) {
                return Ok((Vec::new(), None));
            }
            let plan = transitions::regenerate(view, &record, now)?;
            Ok((plan.operations, Some((plan.record.id, plan.moved_lines))))
        })?;

        match outcome {
            Some((new_id, moved_lines)) => {
                tracing::info!(
                    from = %id.short(),
                    to = %new_id.short(),
                    moved_lines,
                    "[sf-01] session regenerated"
                );
                Ok(new_id)
            }
            None => Ok(id.clone()),
        }
    }

    fn destroy(&self, id: &SessionId) -> SessionResult<()> {
        let now = self.clock.now();
        let destroyed = transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            if transitions::load_record(view, id)?.is_none() {
                return Ok((Vec::new(), false));
            }
            Ok((transitions::retire(id, now)?, true))
        })?;
        if destroyed {
            tracing::info!(session = %id.short(), "[sf-01] session destroyed");
        }
        Ok(())
    }

    fn touch(&self, id: &SessionId) -> SessionResult<()> {
        let now = self.clock.now();
        let policy = self.policy;
        transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            match transitions::lookup(view, id, &policy, now)? {
                Lookup::Live(mut record) => {
                    record.last_seen_at = now;
                    Ok((vec![transitions::put_record(&record)?], ()))
                }
                Lookup::Expired(_) | Lookup::Absent => Err(SessionError::NotFound {
                    session: id.short(),
                }),
            }
        })
    }

    fn purge_expired(&self) -> SessionResult<usize> {
        let now = self.clock.now();
        let policy = self.policy;
        let purged = transact_with(self.store.as_ref(), |view| -> SessionResult<_> {
            let mut ops = Vec::new();
            let mut purged = 0usize;
            for (_, bytes) in view.prefix_scan(&KeyPrefix::Session.family())? {
                let record: SessionRecord = decode_record(&bytes)?;
                if policy.is_expired(&record, now) {
                    ops.extend(transitions::retire(&record.id, now)?);
                    purged += 1;
                }
            }
            let mut lapsed = 0usize;
            for (key, bytes) in view.prefix_scan(&KeyPrefix::RetiredSession.family())? {
                let retired_at: Timestamp = decode_record(&bytes)?;
                if policy.retirement_lapsed(retired_at, now) {
                    ops.push(BatchOperation::delete(key));
                    lapsed += 1;
                }
            }
            Ok((ops, (purged, lapsed)))
        })?;
        let (purged, lapsed) = purged;
        if purged > 0 {
            tracing::info!(purged, "[sf-01] expired sessions purged");
        }
        if lapsed > 0 {
            tracing::debug!(lapsed, "[sf-01] lapsed retirement markers dropped");
        }
        Ok(purged)
    }

    fn is_live_in(&self, view: &dyn KeyValueRead, id: &SessionId) -> Result<bool, KVStoreError> {
        let lookup = transitions::lookup(view, id, &self.policy, self.clock.now())?;
        Ok(matches!(lookup, Lookup::Live(_)))
    }
}
