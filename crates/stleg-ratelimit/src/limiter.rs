use stleg_core::{Pillar, RateLimitHeaders, RateTier};
use stleg_state::StateStore;
use tracing::warn;

const WINDOW_SECONDS: u64 = 60;

const ALL_PILLARS: [Pillar; 4] = [
    Pillar::SeaSide,
    Pillar::DeckSide,
    Pillar::DockSide,
    Pillar::MarketSide,
];

fn counter_key(license_id: &str, pillar: Pillar) -> String {
    format!("ratelimit:{license_id}:{pillar}")
}

#[derive(Debug, Clone)]
pub struct RateLimitOutcome {
    pub admitted: bool,
    pub headers: RateLimitHeaders,
    pub retry_after: Option<u64>,
}

/// Fixed 60-second window limiter: an atomic `INCR` plus a TTL set only on
/// the first increment of the window. Deliberately not a sliding-window
/// approximation — the worst-case over-admission of a plain fixed window
/// (2x ceiling at a window boundary) is an accepted tradeoff for a single
/// atomic store round-trip per request.
pub struct RateLimiter;

impl RateLimiter {
    /// Check and consume one unit of `license_id`'s quota for `pillar` under
    /// `tier`. Fails open (admits, logs a warning) if the backing store is
    /// unavailable — availability over strictness, matching the revocation
    /// check's failure posture.
    pub async fn allow(
        store: &dyn StateStore,
        license_id: &str,
        pillar: Pillar,
        tier: RateTier,
    ) -> RateLimitOutcome {
        let Some(limit) = tier.ceiling() else {
            return RateLimitOutcome {
                admitted: true,
                headers: RateLimitHeaders {
                    limit: u64::MAX,
                    remaining: u64::MAX,
                    reset: 0,
                },
                retry_after: None,
            };
        };

        let key = counter_key(license_id, pillar);

        let counter = match store.incr(&key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, license_id, %pillar, "rate limit counter store error, failing open");
                return RateLimitOutcome {
                    admitted: true,
                    headers: RateLimitHeaders {
                        limit,
                        remaining: limit,
                        reset: WINDOW_SECONDS,
                    },
                    retry_after: None,
                };
            }
        };

        if counter == 1 {
            if let Err(err) = store.set_ttl(&key, WINDOW_SECONDS).await {
                warn!(error = %err, license_id, %pillar, "failed to set rate limit window TTL");
            }
        }

        let ttl = store.ttl(&key).await.unwrap_or(None).unwrap_or(WINDOW_SECONDS);
        #[allow(clippy::cast_sign_loss)]
        let counter = counter.max(0) as u64;

        if counter <= limit {
            RateLimitOutcome {
                admitted: true,
                headers: RateLimitHeaders {
                    limit,
                    remaining: limit.saturating_sub(counter),
                    reset: ttl,
                },
                retry_after: None,
            }
        } else {
            RateLimitOutcome {
                admitted: false,
                headers: RateLimitHeaders {
                    limit,
                    remaining: 0,
                    reset: ttl,
                },
                retry_after: Some(ttl),
            }
        }
    }

    /// Clear a license's counter for one pillar, or every pillar when
    /// `pillar` is `None`. Ambient admin affordance (spec §4.D).
    pub async fn reset(store: &dyn StateStore, license_id: &str, pillar: Option<Pillar>) {
        let pillars: &[Pillar] = match &pillar {
            Some(p) => std::slice::from_ref(p),
            None => &ALL_PILLARS,
        };
        for p in pillars {
            let key = counter_key(license_id, *p);
            if let Err(err) = store.del(&key).await {
                warn!(error = %err, license_id, pillar = %p, "failed to reset rate limit counter");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use stleg_state::MemoryStateStore;

    use super::*;

    #[tokio::test]
    async fn admits_under_ceiling_and_reports_remaining() {
        let store = MemoryStateStore::new();
        let outcome =
            RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        assert!(outcome.admitted);
        assert_eq!(outcome.headers.limit, 100);
        assert_eq!(outcome.headers.remaining, 99);
    }

    #[tokio::test]
    async fn rejects_once_ceiling_exceeded() {
        let store = MemoryStateStore::new();
        for _ in 0..100 {
            let outcome =
                RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
            assert!(outcome.admitted);
        }
        let outcome = RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        assert!(!outcome.admitted);
        assert_eq!(outcome.headers.remaining, 0);
        assert!(outcome.retry_after.is_some());
    }

    #[tokio::test]
    async fn separate_pillars_have_independent_counters() {
        let store = MemoryStateStore::new();
        for _ in 0..100 {
            RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        }
        let rejected = RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        assert!(!rejected.admitted);

        let other_pillar = RateLimiter::allow(&store, "lic_1", Pillar::DeckSide, RateTier::Pul).await;
        assert!(other_pillar.admitted);
    }

    #[tokio::test]
    async fn unlimited_tier_always_admits() {
        let store = MemoryStateStore::new();
        let outcome =
            RateLimiter::allow(&store, "lic_enterprise", Pillar::SeaSide, RateTier::PlE).await;
        assert!(outcome.admitted);
        assert_eq!(outcome.headers.limit, u64::MAX);
    }

    #[tokio::test]
    async fn reset_clears_counter_for_one_pillar_only() {
        let store = MemoryStateStore::new();
        RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        RateLimiter::allow(&store, "lic_1", Pillar::DeckSide, RateTier::Pul).await;

        RateLimiter::reset(&store, "lic_1", Some(Pillar::SeaSide)).await;

        let sea = RateLimiter::allow(&store, "lic_1", Pillar::SeaSide, RateTier::Pul).await;
        let deck = RateLimiter::allow(&store, "lic_1", Pillar::DeckSide, RateTier::Pul).await;
        assert_eq!(sea.headers.remaining, 99);
        assert_eq!(deck.headers.remaining, 98);
    }
}
