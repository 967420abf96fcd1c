//! # Concurrent Request Tests
//!
//! Two tabs of the same visitor racing each other must never lose an update
//! and must never both spend one forgery token.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, BACKENDS};
    use sf_01_session_identity::SessionApi;
    use sf_02_forgery_guard::{ForgeryGuardApi, Validation};
    use sf_04_cart_service::CartApi;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const THREADS: usize = 8;
    const ADDS_PER_THREAD: usize = 20;

    #[test]
    fn test_concurrent_adds_to_same_line_all_count() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, 3);
            let cart = &fixture.container.cart;
            let session = fixture.container.sessions.ensure_session(None).unwrap().id;

            std::thread::scope(|scope| {
                for _ in 0..THREADS {
                    scope.spawn(|| {
                        for _ in 0..ADDS_PER_THREAD {
                            cart.add_to_cart(&session, 2, 1).unwrap();
                        }
                    });
                }
            });

            let summary = cart.summary(&session).unwrap();
            assert_eq!(summary.lines.len(), 1, "{:?}", backend);
            assert_eq!(
                summary.item_count,
                (THREADS * ADDS_PER_THREAD) as u64,
                "{:?}",
                backend
            );
        }
    }

    #[test]
    fn test_concurrent_adds_across_products_stay_unique() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, 4);
            let cart = &fixture.container.cart;
            let session = fixture.container.sessions.ensure_session(None).unwrap().id;

            std::thread::scope(|scope| {
                for t in 0..THREADS {
                    let session = &session;
                    scope.spawn(move || {
                        let product = (t % 4) as i64 + 1;
                        for _ in 0..ADDS_PER_THREAD {
                            cart.add_to_cart(session, product, 2).unwrap();
                        }
                    });
                }
            });

            let summary = cart.summary(&session).unwrap();
            assert_eq!(summary.lines.len(), 4, "{:?}", backend);
            for line in &summary.lines {
                assert_eq!(line.quantity, 2 * 2 * ADDS_PER_THREAD as u32);
            }
            assert_eq!(summary.total.to_string(), "3200.00");
        }
    }

    #[test]
    fn test_token_spent_at_most_once_under_race() {
        for backend in BACKENDS {
            let fixture = Fixture::new(backend, 0);
            let sessions = &fixture.container.sessions;
            let guard = &fixture.container.guard;
            let session = sessions.ensure_session(None).unwrap().id;
            let token = guard.issue_or_get(&session).unwrap();
            let accepted = AtomicUsize::new(0);

            std::thread::scope(|scope| {
                for _ in 0..THREADS {
                    scope.spawn(|| {
                        let outcome = guard
                            .validate_and_consume(&session, Some(token.as_str()))
                            .unwrap();
                        if let Validation::Accepted { .. } = outcome {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            });

            assert_eq!(accepted.load(Ordering::SeqCst), 1, "{:?}", backend);
        }
    }
}
