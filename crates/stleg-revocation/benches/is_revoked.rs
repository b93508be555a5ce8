use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use stleg_revocation::{BloomCrl, BloomCrlConfig, RevocationRecord};
use stleg_state::{MemoryStateStore, StateStore};

const SEEDED_REVOCATIONS: usize = 10_000;

async fn seeded_crl() -> (BloomCrl, Arc<dyn StateStore>) {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let crl = BloomCrl::new(BloomCrlConfig::default());

    for i in 0..SEEDED_REVOCATIONS {
        let record = RevocationRecord {
            reason: "fraud".to_owned(),
            revoked_by: "ops@example.com".to_owned(),
            notes: None,
            revoked_at: 1_700_000_000,
        };
        crl.revoke(store.as_ref(), &format!("lic_revoked_{i}"), &record)
            .await
            .expect("seed revocation");
    }
    // Force the initial rebuild outside the measured loop.
    crl.is_revoked(store.as_ref(), "lic_revoked_0").await;

    (crl, store)
}

fn bench_fast_path_negative(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let (crl, store) = rt.block_on(seeded_crl());

    c.bench_function("is_revoked_fast_path_negative", |b| {
        b.iter(|| {
            rt.block_on(async {
                let revoked = crl.is_revoked(store.as_ref(), black_box("lic_never_revoked")).await;
                black_box(revoked)
            })
        });
    });
}

fn bench_confirmed_positive(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let (crl, store) = rt.block_on(seeded_crl());

    c.bench_function("is_revoked_confirmed_positive", |b| {
        b.iter(|| {
            rt.block_on(async {
                let revoked = crl.is_revoked(store.as_ref(), black_box("lic_revoked_1234")).await;
                black_box(revoked)
            })
        });
    });
}

criterion_group!(benches, bench_fast_path_negative, bench_confirmed_positive);
criterion_main!(benches);
