//! # Regeneration Atomicity
//!
//! Rotating a session identifier re-keys every cart line it owns in the same
//! batch. Any snapshot of the store sees the whole cart under exactly one
//! identifier, never a split.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, BACKENDS};
    use sf_01_session_identity::SessionApi;
    use sf_02_forgery_guard::{ForgeryGuardApi, Validation};
    use sf_04_cart_service::CartApi;
    use shared_types::{decode_record, CartLine, KeyPrefix, KeyValueStore, SessionId};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const LINES: i64 = 12;
    const ROTATIONS: usize = 20;

    fn owners(fixture: &Fixture) -> (HashSet<SessionId>, usize) {
        let rows = fixture
            .container
            .store
            .prefix_scan(&KeyPrefix::CartLine.family())
            .unwrap();
        let owners = rows
            .iter()
            .map(|(_, bytes)| decode_record::<CartLine>(bytes).unwrap().session_id)
            .collect();
        (owners, rows.len())
    }

    #[test]
    fn test_snapshots_never_see_split_cart() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, LINES as usize);
            let sessions = &fixture.container.sessions;
            let mut current = sessions.ensure_session(None).unwrap().id;
            for product in 1..=LINES {
                fixture.container.cart.add_to_cart(&current, product, 1).unwrap();
            }

            let done = AtomicBool::new(false);
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    while !done.load(Ordering::SeqCst) {
                        let (owners, rows) = owners(&fixture);
                        assert_eq!(owners.len(), 1, "{:?}: cart split", backend);
                        assert_eq!(rows, LINES as usize, "{:?}", backend);
                    }
                });

                for _ in 0..ROTATIONS {
                    fixture.clock.advance(Duration::from_secs(31 * 60));
                    let next = sessions.maybe_regenerate(&current).unwrap();
                    assert_ne!(next, current);
                    current = next;
                }
                done.store(true, Ordering::SeqCst);
            });

            let (owners, _) = owners(&fixture);
            assert_eq!(owners, HashSet::from([current.clone()]));
            assert_eq!(
                fixture.container.cart.item_count(&current).unwrap(),
                LINES as u64
            );
        }
    }

    #[test]
    fn test_token_consumption_moves_cart_with_session() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, 2);
            let container = &fixture.container;
            let session = container.sessions.ensure_session(None).unwrap().id;
            container.cart.add_to_cart(&session, 1, 3).unwrap();
            container.cart.add_to_cart(&session, 2, 1).unwrap();

            let token = container.guard.issue_or_get(&session).unwrap();
            let moved = match container
                .guard
                .validate_and_consume(&session, Some(token.as_str()))
                .unwrap()
            {
                Validation::Accepted { session } => session,
                Validation::Rejected => panic!("{:?}: live token rejected", backend),
            };

            assert_ne!(moved, session);
            assert_eq!(container.cart.item_count(&session).unwrap(), 0);
            assert_eq!(container.cart.item_count(&moved).unwrap(), 4);

            // The old identifier is retired for good.
            let handle = container
                .sessions
                .ensure_session(Some(session.as_str()))
                .unwrap();
            assert!(handle.issued);
            assert_ne!(handle.id, session);
        }
    }
}
