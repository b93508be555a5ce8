use stleg_core::{OverageBehavior, PlClaims, RejectionReason};
use stleg_state::StateStore;
use tracing::warn;

use crate::billing::BillingEvent;
use crate::config::OverageRates;

const IDEMPOTENCY_TTL_SECONDS: u64 = 40 * 24 * 3600;

#[derive(Debug, Default)]
pub struct QuotaOutcome {
    pub quota_warning: Option<String>,
    pub retry_after: Option<u64>,
}

fn usage_key(license_id: &str, resource: &str, period: &str) -> String {
    format!("usage:{license_id}:{resource}:{period}")
}

fn idempotency_key(license_id: &str, resource: &str, period: &str, key: &str) -> String {
    format!("idem:{license_id}:{resource}:{period}:{key}")
}

/// Quota enforcement for a single metered resource (spec §4.E). `period`
/// is the `YYYYMM` bucket the caller computed from the current wall clock.
pub async fn check_quota(
    store: &dyn StateStore,
    claims: &PlClaims,
    resource: &str,
    period: &str,
    idempotency_key_header: Option<&str>,
    rates: &OverageRates,
) -> Result<QuotaOutcome, RejectionReason> {
    let Some(&limit) = claims.limits.get(resource) else {
        return Ok(QuotaOutcome::default());
    };

    if let Some(key) = idempotency_key_header {
        let full_key = idempotency_key(&claims.license_id, resource, period, key);
        match store.check_and_set(&full_key, "1", Some(IDEMPOTENCY_TTL_SECONDS)).await {
            Ok(false) => return Ok(QuotaOutcome::default()),
            Ok(true) => {}
            Err(err) => {
                warn!(error = %err, "idempotency store error, proceeding without dedup guard");
            }
        }
    }

    let key = usage_key(&claims.license_id, resource, period);
    let usage = match store.incr(&key).await {
        Ok(value) => value.max(0).unsigned_abs(),
        Err(err) => {
            warn!(error = %err, "usage counter store error, failing open");
            return Ok(QuotaOutcome::default());
        }
    };

    if usage <= limit {
        return Ok(QuotaOutcome::default());
    }

    let overage_behavior = claims
        .billing
        .as_ref()
        .map_or(OverageBehavior::Throttle, |b| b.overage);

    match overage_behavior {
        OverageBehavior::Bill => {
            let rate = rates.rate_for(resource);
            let event = BillingEvent::new(
                claims.license_id.clone(),
                claims.org.clone(),
                resource.to_owned(),
                limit,
                usage,
                rate,
            );
            event.emit();
            Ok(QuotaOutcome {
                quota_warning: Some(format!(
                    "{resource} quota exceeded: {usage}/{limit}, billed at {rate} per unit"
                )),
                retry_after: None,
            })
        }
        OverageBehavior::Throttle => Err(RejectionReason::RateLimited),
        OverageBehavior::Block => Err(RejectionReason::PaymentRequired),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use stleg_core::{Billing, Tier};
    use stleg_state::MemoryStateStore;

    use super::*;

    fn claims(limit: u64, overage: OverageBehavior) -> PlClaims {
        let mut limits = HashMap::new();
        limits.insert("qr_scans".to_owned(), limit);
        PlClaims {
            license_id: "lic_1".to_owned(),
            org: None,
            exp: 9_999_999_999,
            tier: Tier::PlB,
            features: HashSet::new(),
            domain_bind: HashSet::new(),
            limits,
            billing: Some(Billing { overage }),
        }
    }

    #[tokio::test]
    async fn admits_under_limit() {
        let store = MemoryStateStore::new();
        let claims = claims(10, OverageBehavior::Block);
        let outcome = check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default())
            .await
            .unwrap();
        assert!(outcome.quota_warning.is_none());
    }

    #[tokio::test]
    async fn block_policy_rejects_with_payment_required() {
        let store = MemoryStateStore::new();
        let claims = claims(1, OverageBehavior::Block);
        check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default())
            .await
            .unwrap();
        let result =
            check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default()).await;
        assert!(matches!(result, Err(RejectionReason::PaymentRequired)));
    }

    #[tokio::test]
    async fn throttle_policy_rejects_rate_limited() {
        let store = MemoryStateStore::new();
        let claims = claims(1, OverageBehavior::Throttle);
        check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default())
            .await
            .unwrap();
        let result =
            check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default()).await;
        assert!(matches!(result, Err(RejectionReason::RateLimited)));
    }

    #[tokio::test]
    async fn bill_policy_admits_with_quota_warning() {
        let store = MemoryStateStore::new();
        let claims = claims(1, OverageBehavior::Bill);
        check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default())
            .await
            .unwrap();
        let outcome =
            check_quota(&store, &claims, "qr_scans", "202607", None, &OverageRates::default())
                .await
                .unwrap();
        assert!(outcome.quota_warning.is_some());
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_suppresses_second_increment() {
        let store = MemoryStateStore::new();
        let claims = claims(5, OverageBehavior::Block);
        check_quota(&store, &claims, "qr_scans", "202607", Some("req-1"), &OverageRates::default())
            .await
            .unwrap();
        check_quota(&store, &claims, "qr_scans", "202607", Some("req-1"), &OverageRates::default())
            .await
            .unwrap();
        let usage = store.get(&usage_key("lic_1", "qr_scans", "202607")).await.unwrap();
        assert_eq!(usage, Some("1".to_owned()));
    }
}
