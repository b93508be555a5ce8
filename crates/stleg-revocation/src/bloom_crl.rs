use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use bloomfilter::Bloom;
use stleg_state::StateStore;
use tracing::{info, warn};

use crate::error::RevocationError;
use crate::store;

#[derive(Debug, Clone, Copy)]
pub struct BloomCrlConfig {
    pub capacity: usize,
    pub false_positive_rate: f64,
    pub refresh_interval: Duration,
}

impl Default for BloomCrlConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            false_positive_rate: 1e-4,
            refresh_interval: Duration::from_secs(300),
        }
    }
}

struct FilterState {
    bloom: Bloom<String>,
    built_at: Instant,
    membership_count: usize,
}

#[derive(Debug, Default, Clone)]
pub struct RevocationStats {
    pub total_checks: u64,
    pub fast_path_negatives: u64,
    pub bloom_positives: u64,
    pub confirmed_false_positives: u64,
    pub rebuild_count: u64,
    pub membership_count: usize,
}

/// Constant-time-ish ("is this license revoked?") answer backed by a Bloom
/// filter with an authoritative store fallback on positive. No false
/// negatives: every `license_id` present in the store at the last rebuild
/// probes positive.
pub struct BloomCrl {
    config: BloomCrlConfig,
    filter: ArcSwapOption<FilterState>,
    stale: AtomicBool,
    rebuilding: AtomicBool,
    total_checks: AtomicU64,
    fast_path_negatives: AtomicU64,
    bloom_positives: AtomicU64,
    confirmed_false_positives: AtomicU64,
    rebuild_count: AtomicU64,
}

impl BloomCrl {
    #[must_use]
    pub fn new(config: BloomCrlConfig) -> Self {
        Self {
            config,
            filter: ArcSwapOption::empty(),
            stale: AtomicBool::new(true),
            rebuilding: AtomicBool::new(false),
            total_checks: AtomicU64::new(0),
            fast_path_negatives: AtomicU64::new(0),
            bloom_positives: AtomicU64::new(0),
            confirmed_false_positives: AtomicU64::new(0),
            rebuild_count: AtomicU64::new(0),
        }
    }

    /// Mark the filter stale so the next query (or the background task)
    /// triggers a rebuild. Called eagerly by the revoke/unrevoke admin
    /// operations to bound propagation latency below `refresh_interval`.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    fn current(&self) -> Option<Arc<FilterState>> {
        self.filter.load_full()
    }

    /// Rebuild the filter from the authoritative store. Single-flight: if a
    /// rebuild is already underway, returns immediately without duplicating
    /// work, leaving the prior filter (if any) serving queries.
    async fn rebuild(&self, store: &dyn StateStore) -> Result<(), RevocationError> {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        let result = self.rebuild_inner(store).await;
        self.rebuilding.store(false, Ordering::SeqCst);
        result
    }

    async fn rebuild_inner(&self, store: &dyn StateStore) -> Result<(), RevocationError> {
        let start = Instant::now();
        let revoked = store::list_revoked(store).await?;

        let capacity = self.config.capacity.max(revoked.len()).max(1);
        let mut bloom = Bloom::new_for_fp_rate(capacity, self.config.false_positive_rate);
        for license_id in &revoked {
            bloom.set(license_id);
        }

        let membership_count = revoked.len();
        self.filter.store(Some(Arc::new(FilterState {
            bloom,
            built_at: Instant::now(),
            membership_count,
        })));
        self.stale.store(false, Ordering::SeqCst);
        self.rebuild_count.fetch_add(1, Ordering::Relaxed);

        info!(
            membership_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "revocation bloom filter rebuilt"
        );
        Ok(())
    }

    /// Query protocol: stale/uninitialized filter triggers a rebuild (unless
    /// one is already in flight); a negative probe returns immediately; a
    /// positive probe is confirmed against the authoritative store. Fails
    /// open on authoritative-store errors.
    pub async fn is_revoked(&self, store: &dyn StateStore, license_id: &str) -> bool {
        if self.stale.load(Ordering::SeqCst) || self.current().is_none() {
            if let Err(err) = self.rebuild(store).await {
                warn!(error = %err, "bloom filter rebuild failed, falling through to authoritative store");
                return store::is_revoked(store, license_id)
                    .await
                    .unwrap_or_else(|err| {
                        warn!(error = %err, "authoritative revocation store check failed, failing open");
                        false
                    });
            }
        }

        let Some(state) = self.current() else {
            return store::is_revoked(store, license_id)
                .await
                .unwrap_or(false);
        };

        self.total_checks.fetch_add(1, Ordering::Relaxed);

        if !state.bloom.check(&license_id.to_owned()) {
            self.fast_path_negatives.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.bloom_positives.fetch_add(1, Ordering::Relaxed);
        match store::is_revoked(store, license_id).await {
            Ok(true) => true,
            Ok(false) => {
                self.confirmed_false_positives.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(err) => {
                warn!(error = %err, "authoritative revocation store check failed, failing open");
                false
            }
        }
    }

    /// Direct authoritative lookup, bypassing the Bloom filter entirely
    /// (used by the admin check endpoint).
    pub async fn check_direct(
        &self,
        store: &dyn StateStore,
        license_id: &str,
    ) -> Result<bool, RevocationError> {
        store::is_revoked(store, license_id).await
    }

    pub async fn revoke(
        &self,
        store: &dyn StateStore,
        license_id: &str,
        record: &store::RevocationRecord,
    ) -> Result<(), RevocationError> {
        store::revoke(store, license_id, record).await?;
        self.mark_stale();
        Ok(())
    }

    pub async fn unrevoke(
        &self,
        store: &dyn StateStore,
        license_id: &str,
    ) -> Result<bool, RevocationError> {
        let removed = store::unrevoke(store, license_id).await?;
        self.mark_stale();
        Ok(removed)
    }

    pub async fn list_revoked(&self, store: &dyn StateStore) -> Result<Vec<String>, RevocationError> {
        store::list_revoked(store).await
    }

    /// Recorded reason/operator/timestamp for a single revocation, bypassing
    /// the Bloom filter (used by the admin check endpoint).
    pub async fn lookup_metadata(
        &self,
        store: &dyn StateStore,
        license_id: &str,
    ) -> Result<Option<store::RevocationRecord>, RevocationError> {
        store::lookup_metadata(store, license_id).await
    }

    /// Every revoked license with its metadata (used by the admin listing
    /// endpoint).
    pub async fn list_revoked_with_metadata(
        &self,
        store: &dyn StateStore,
    ) -> Result<Vec<(String, store::RevocationRecord)>, RevocationError> {
        store::enumerate_with_metadata(store).await
    }

    #[must_use]
    pub fn get_stats(&self) -> RevocationStats {
        RevocationStats {
            total_checks: self.total_checks.load(Ordering::Relaxed),
            fast_path_negatives: self.fast_path_negatives.load(Ordering::Relaxed),
            bloom_positives: self.bloom_positives.load(Ordering::Relaxed),
            confirmed_false_positives: self.confirmed_false_positives.load(Ordering::Relaxed),
            rebuild_count: self.rebuild_count.load(Ordering::Relaxed),
            membership_count: self.current().map_or(0, |s| s.membership_count),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }

    #[must_use]
    pub fn last_refresh_age(&self) -> Option<Duration> {
        self.current().map(|s| s.built_at.elapsed())
    }

    /// Drive the periodic background refresh. Intended to be spawned as its
    /// own task for the lifetime of the server.
    pub async fn run_background_refresh(&self, store: &dyn StateStore) {
        loop {
            tokio::time::sleep(self.config.refresh_interval).await;
            self.mark_stale();
            if let Err(err) = self.rebuild(store).await {
                warn!(error = %err, "scheduled bloom filter rebuild failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use stleg_state::MemoryStateStore;

    use super::*;

    fn record() -> store::RevocationRecord {
        store::RevocationRecord {
            reason: "fraud".to_owned(),
            revoked_by: "ops@example.com".to_owned(),
            notes: None,
            revoked_at: 1_000,
        }
    }

    #[tokio::test]
    async fn no_false_negatives_for_revoked_license() {
        let store = MemoryStateStore::new();
        let crl = BloomCrl::new(BloomCrlConfig::default());

        crl.revoke(&store, "lic_revoked", &record()).await.unwrap();

        assert!(crl.is_revoked(&store, "lic_revoked").await);
        assert!(!crl.is_revoked(&store, "lic_clean").await);
    }

    #[tokio::test]
    async fn unrevoke_clears_membership_after_rebuild() {
        let store = MemoryStateStore::new();
        let crl = BloomCrl::new(BloomCrlConfig::default());

        crl.revoke(&store, "lic_a", &record()).await.unwrap();
        assert!(crl.is_revoked(&store, "lic_a").await);

        crl.unrevoke(&store, "lic_a").await.unwrap();
        assert!(!crl.is_revoked(&store, "lic_a").await);
    }

    #[tokio::test]
    async fn stats_track_fast_path_and_positive_checks() {
        let store = MemoryStateStore::new();
        let crl = BloomCrl::new(BloomCrlConfig::default());
        crl.revoke(&store, "lic_a", &record()).await.unwrap();

        crl.is_revoked(&store, "lic_clean").await;
        crl.is_revoked(&store, "lic_a").await;

        let stats = crl.get_stats();
        assert_eq!(stats.membership_count, 1);
        assert!(stats.fast_path_negatives >= 1);
        assert!(stats.bloom_positives >= 1);
    }

    #[tokio::test]
    async fn check_direct_bypasses_bloom() {
        let store = MemoryStateStore::new();
        let crl = BloomCrl::new(BloomCrlConfig::default());
        crl.revoke(&store, "lic_a", &record()).await.unwrap();

        assert!(crl.check_direct(&store, "lic_a").await.unwrap());
        assert!(!crl.check_direct(&store, "lic_missing").await.unwrap());
    }
}
