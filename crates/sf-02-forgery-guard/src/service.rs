//! Forgery Guard Service

use crate::error::{ForgeryError, ForgeryResult};
use crate::ports::inbound::{ForgeryGuardApi, Validation};
use sf_01_session_identity::domain::transitions::{self, Lookup};
use sf_01_session_identity::{ForgeryToken, SessionError, SessionPolicy, TokenSlot};
use shared_types::{transact_with, KeyValueStore, SessionId, TimeSource};
use std::sync::Arc;

/// Forgery-Token Guard over the session records.
pub struct ForgeryGuard {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    policy: SessionPolicy,
}

impl ForgeryGuard {
    /// `policy` must be the one the session manager uses, so both agree on
    /// which sessions are live.
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
}

impl ForgeryGuardApi for ForgeryGuard {
    fn issue_or_get(&self, session: &SessionId) -> ForgeryResult<ForgeryToken> {
        let now = self.clock.now();
        let policy = self.policy;

        let (token, fresh) = transact_with(self.store.as_ref(), |view| -> ForgeryResult<_> {
            let mut record = match transitions::lookup(view, session, &policy, now)? {
                Lookup::Live(record) => record,
                Lookup::Expired(_) | Lookup::Absent => {
                    return Err(SessionError::NotFound {
                        session: session.short(),
                    }
                    .into())
                }
            };
            if let Some(token) = record.token.live_token() {
                return Ok((Vec::new(), (token.clone(), false)));
            }
            let token = ForgeryToken::generate();
            record.token = TokenSlot::Issued(token.clone());
            Ok((vec![transitions::put_record(&record)?], (token, true)))
        })?;

        if fresh {
            tracing::debug!(session = %session.short(), token = ?token, "[sf-02] forgery token issued");
        }
        Ok(token)
    }

    fn validate_and_consume(
        &self,
        session: &SessionId,
        candidate: Option<&str>,
    ) -> ForgeryResult<Validation> {
        let now = self.clock.now();
        let policy = self.policy;

        let outcome = transact_with(self.store.as_ref(), |view| -> ForgeryResult<_> {
            let mut record = match transitions::lookup(view, session, &policy, now)? {
                Lookup::Live(record) => record,
                Lookup::Expired(_) | Lookup::Absent => {
                    return Ok((Vec::new(), Validation::Rejected))
                }
            };
            let matched = match (record.token.live_token(), candidate) {
                (Some(token), Some(candidate)) => token.matches(candidate),
                _ => false,
            };
            if !matched {
                return Ok((Vec::new(), Validation::Rejected));
            }

            record.token = TokenSlot::Consumed;
            let plan = transitions::regenerate(view, &record, now).map_err(ForgeryError::from)?;
            Ok((
                plan.operations,
                Validation::Accepted {
                    session: plan.record.id,
                },
            ))
        })?;

        match &outcome {
            Validation::Accepted { session: next } => tracing::debug!(
                from = %session.short(),
                to = %next.short(),
                "[sf-02] forgery token consumed, session regenerated"
            ),
            Validation::Rejected => tracing::warn!(
                session = %session.short(),
                presented = candidate.is_some(),
                "[sf-02] forgery token rejected"
            ),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_01_session_identity::{SessionApi, SessionManager};
    use shared_types::{
        encode_record, BatchOperation, CartLine, ErrorKind, InMemoryKVStore, KeyPrefix,
        ManualTimeSource, ProductId,
    };
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryKVStore>,
        clock: Arc<ManualTimeSource>,
        sessions: SessionManager,
        guard: ForgeryGuard,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryKVStore::new());
        let clock = Arc::new(ManualTimeSource::new(1_700_000_000_000));
        let policy = SessionPolicy::default();
        Fixture {
            sessions: SessionManager::new(store.clone(), clock.clone(), policy),
            guard: ForgeryGuard::new(store.clone(), clock.clone(), policy),
            store,
            clock,
        }
    }

    fn new_session(f: &Fixture) -> SessionId {
        f.sessions.ensure_session(None).unwrap().id
    }

    #[test]
    fn test_issue_or_get_is_idempotent() {
        let f = fixture();
        let session = new_session(&f);
        let first = f.guard.issue_or_get(&session).unwrap();
        let second = f.guard.issue_or_get(&session).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tokens_differ_between_sessions() {
        let f = fixture();
        let a = f.guard.issue_or_get(&new_session(&f)).unwrap();
        let b = f.guard.issue_or_get(&new_session(&f)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_valid_token_is_consumed_once() {
        let f = fixture();
        let session = new_session(&f);
        let token = f.guard.issue_or_get(&session).unwrap();

        let accepted = f
            .guard
            .validate_and_consume(&session, Some(token.as_str()))
            .unwrap();
        let next = match accepted {
            Validation::Accepted { session } => session,
            Validation::Rejected => panic!("valid token rejected"),
        };
        assert_ne!(next, session);

        // Replay against either identifier fails.
        assert_eq!(
            f.guard
                .validate_and_consume(&next, Some(token.as_str()))
                .unwrap(),
            Validation::Rejected
        );
        assert_eq!(
            f.guard
                .validate_and_consume(&session, Some(token.as_str()))
                .unwrap(),
            Validation::Rejected
        );

        // A fresh token is issued for the next form.
        let fresh = f.guard.issue_or_get(&next).unwrap();
        assert_ne!(fresh, token);
    }

    #[test]
    fn test_consumed_slot_is_stored_until_reissue() {
        let f = fixture();
        let session = new_session(&f);
        let token = f.guard.issue_or_get(&session).unwrap();
        let next = f.guard.require(&session, Some(token.as_str())).unwrap();

        let record = f.sessions.load(&next).unwrap().unwrap();
        assert_eq!(record.token, TokenSlot::Consumed);

        let fresh = f.guard.issue_or_get(&next).unwrap();
        let record = f.sessions.load(&next).unwrap().unwrap();
        assert_eq!(record.token, TokenSlot::Issued(fresh));
    }

    #[test]
    fn test_mismatch_leaves_token_live() {
        let f = fixture();
        let session = new_session(&f);
        let token = f.guard.issue_or_get(&session).unwrap();

        let wrong = ForgeryToken::generate();
        assert!(!f
            .guard
            .validate_and_consume(&session, Some(wrong.as_str()))
            .unwrap()
            .is_accepted());
        assert_eq!(f.guard.issue_or_get(&session).unwrap(), token);
    }

    #[test]
    fn test_missing_candidate_is_mismatch() {
        let f = fixture();
        let session = new_session(&f);
        f.guard.issue_or_get(&session).unwrap();

        let err = f.guard.require(&session, None).unwrap_err();
        assert_eq!(err, ForgeryError::Mismatch);
        assert_eq!(err.kind(), ErrorKind::ForgeryTokenMismatch);
    }

    #[test]
    fn test_no_token_state_rejects() {
        let f = fixture();
        let session = new_session(&f);
        assert_eq!(
            f.guard.validate_and_consume(&session, Some("")).unwrap(),
            Validation::Rejected
        );
    }

    #[test]
    fn test_token_of_other_session_rejected() {
        let f = fixture();
        let a = new_session(&f);
        let b = new_session(&f);
        f.guard.issue_or_get(&a).unwrap();
        let token_b = f.guard.issue_or_get(&b).unwrap();
        assert!(f.guard.require(&a, Some(token_b.as_str())).is_err());
    }

    #[test]
    fn test_consumption_moves_cart_with_session() {
        let f = fixture();
        let session = new_session(&f);
        let product = ProductId::new(7).unwrap();
        let line = CartLine {
            session_id: session.clone(),
            product_id: product,
            quantity: 2,
            created_at: 0,
            updated_at: 0,
        };
        f.store
            .atomic_batch_write(vec![BatchOperation::put(
                KeyPrefix::cart_line(&session, product),
                encode_record(&line).unwrap(),
            )])
            .unwrap();

        let token = f.guard.issue_or_get(&session).unwrap();
        let next = f.guard.require(&session, Some(token.as_str())).unwrap();

        assert!(f
            .store
            .get(&KeyPrefix::cart_line(&session, product))
            .unwrap()
            .is_none());
        assert!(f
            .store
            .get(&KeyPrefix::cart_line(&next, product))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_expired_session_cannot_validate() {
        let f = fixture();
        let session = new_session(&f);
        let token = f.guard.issue_or_get(&session).unwrap();
        f.clock.advance(Duration::from_secs(2 * 3600));
        assert!(f.guard.require(&session, Some(token.as_str())).is_err());
        assert_eq!(
            f.guard.issue_or_get(&session).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_storage_failure_is_not_mismatch() {
        let f = fixture();
        let session = new_session(&f);
        let token = f.guard.issue_or_get(&session).unwrap();
        f.store.set_available(false);

        let err = f
            .guard
            .validate_and_consume(&session, Some(token.as_str()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }
}
