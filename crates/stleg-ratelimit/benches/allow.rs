use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use stleg_core::{Pillar, RateTier};
use stleg_ratelimit::RateLimiter;
use stleg_state::{MemoryStateStore, StateStore};

fn bench_allow_under_ceiling(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());

    c.bench_function("allow_single_license_under_ceiling", |b| {
        b.iter(|| {
            rt.block_on(async {
                let outcome = RateLimiter::allow(
                    store.as_ref(),
                    black_box("lic_bench"),
                    black_box(Pillar::SeaSide),
                    black_box(RateTier::PlP),
                )
                .await;
                black_box(outcome)
            })
        });
    });
}

fn bench_allow_many_licenses(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());

    c.bench_function("allow_rotating_licenses_same_pillar", |b| {
        let mut i: u64 = 0;
        b.iter(|| {
            i = i.wrapping_add(1);
            let license_id = format!("lic_{i}");
            rt.block_on(async {
                let outcome = RateLimiter::allow(
                    store.as_ref(),
                    black_box(&license_id),
                    black_box(Pillar::DockSide),
                    black_box(RateTier::PlB),
                )
                .await;
                black_box(outcome)
            })
        });
    });
}

criterion_group!(benches, bench_allow_under_ceiling, bench_allow_many_licenses);
criterion_main!(benches);
