//! # Cart Benchmarks
//!
//! | Operation | Path |
//! |-----------|------|
//! | `add_to_cart` | validate → catalog lookup (cached) → transact merge |
//! | `summary` | prefix scan → price every line |
//! | `validate_and_consume` | token check → regeneration → cart re-key |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sf_01_session_identity::SessionApi;
use sf_02_forgery_guard::ForgeryGuardApi;
use sf_04_cart_service::CartApi;
use sf_tests::fixtures::{Backend, Fixture};

fn bench_add_to_cart(c: &mut Criterion) {
    let mut group = c.benchmark_group("sf-04-add-to-cart");
    for backend in [Backend::Memory, Backend::RocksDb] {
        let fixture = Fixture::new(backend, 50);
        let session = fixture.container.sessions.ensure_session(None).unwrap().id;
        let mut product = 0i64;
        group.bench_function(BenchmarkId::from_parameter(format!("{:?}", backend)), |b| {
            b.iter(|| {
                product = product % 50 + 1;
                // Keep lines far below the cap.
                if product == 1 {
                    fixture.container.cart.clear(&session).unwrap();
                }
                black_box(fixture.container.cart.add_to_cart(&session, product, 1).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("sf-04-summary");
    for lines in [1usize, 10, 50] {
        let fixture = Fixture::new(Backend::Memory, lines);
        let session = fixture.container.sessions.ensure_session(None).unwrap().id;
        for product in 1..=lines as i64 {
            fixture.container.cart.add_to_cart(&session, product, 2).unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| black_box(fixture.container.cart.summary(&session).unwrap()))
        });
    }
    group.finish();
}

fn bench_token_cycle(c: &mut Criterion) {
    let fixture = Fixture::new(Backend::Memory, 10);
    let container = &fixture.container;
    let mut session = container.sessions.ensure_session(None).unwrap().id;
    for product in 1..=10 {
        container.cart.add_to_cart(&session, product, 1).unwrap();
    }

    c.bench_function("sf-02-validate-and-consume", |b| {
        b.iter(|| {
            let token = container.guard.issue_or_get(&session).unwrap();
            session = container
                .guard
                .require(&session, Some(token.as_str()))
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_add_to_cart, bench_summary, bench_token_cycle);
criterion_main!(benches);
