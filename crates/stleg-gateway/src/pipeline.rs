use std::sync::Arc;

use chrono::DateTime;
use stleg_core::{
    CorrelationId, Decision, LicenseClaims, Pillar, RateLimitHeaders, RateTier, RejectionReason,
    RequestContext,
};
use stleg_crypto::normalize_timing;
use stleg_ratelimit::RateLimiter;
use tokio::time::Instant;
use tracing::warn;

use crate::quota;
use crate::state::GatewayState;

/// Seconds between quota rejections and the next retry, per the metered
/// `throttle` policy (spec §4.E): a day, not the 60-second rate-limit
/// window, since the resource resets monthly rather than per-minute.
const THROTTLE_RETRY_AFTER_SECONDS: u64 = 24 * 3_600;

/// Reject, logging at WARN with the fields spec §7 requires: correlation
/// id, reason, a redacted license id (first 16 characters — full ids are
/// not leaked to logs), route, and `retry_after` as the quantitative
/// context when present. Every terminal rejection in `evaluate` routes
/// through this so none is silently unlogged.
fn reject(
    ctx: &RequestContext,
    method: &str,
    path: &str,
    reason: RejectionReason,
    retry_after: Option<u64>,
    rate_limit: Option<RateLimitHeaders>,
    tier: Option<RateTier>,
) -> Decision<RequestContext> {
    let correlation_id = ctx.correlation_id.as_ref().map_or("-", CorrelationId::as_str);
    let license_id = ctx
        .claims
        .as_ref()
        .map(|claims| redact_license_id(claims.license_id()));
    let route = format!("{method}:{path}");
    warn!(
        correlation_id,
        reason = %reason,
        license_id = license_id.as_deref().unwrap_or("-"),
        route = %route,
        retry_after = ?retry_after,
        "request rejected"
    );
    Decision::Reject {
        reason,
        retry_after,
        rate_limit,
        tier,
    }
}

/// First 16 characters of a `license_id`, per spec §7's redaction rule for
/// WARN-level rejection logs.
fn redact_license_id(license_id: &str) -> String {
    license_id.chars().take(16).collect()
}

/// The six-stage admission pipeline (spec §4), collapsed into one composable
/// chain instead of the source's three near-duplicate middlewares (spec
/// §9). Each stage returns early through `?`/`Decision::Reject` the moment a
/// terminal verdict is reached; the admission semaphore itself (§4.F) is
/// acquired by the caller after this function returns `Decision::Admit`,
/// since it brackets the downstream handler call rather than being part of
/// the decision chain.
pub async fn evaluate(
    state: &GatewayState,
    method: &str,
    path: &str,
    host: Option<&str>,
    license_token: Option<&str>,
    idempotency_key: Option<&str>,
    correlation_id: CorrelationId,
    now: i64,
) -> Decision<RequestContext> {
    let mut ctx = RequestContext::new(correlation_id);

    // A. Route Classifier.
    let Some(token) = license_token else {
        return if state.routes.is_public(method, path) {
            Decision::Admit(ctx)
        } else {
            reject(&ctx, method, path, RejectionReason::RouteRequiresLicense, None, None, None)
        };
    };

    // B. Token Verifier + C. Revocation Check, under a single timing-
    // normalization window. Both stages are timing-sensitive: an attacker
    // watching only wall-clock latency must not be able to tell "bad
    // signature" from "good signature, revoked license" apart (spec §7).
    // Padding each stage separately would stack two floors back to back and
    // make the revoked verdict cost ~2x the invalid-signature one, so both
    // are measured from one origin and normalized exactly once.
    let verification_start = Instant::now();
    let claims = match state.verifier.verify_unpadded(token, now).await {
        Ok((_header, claims)) => claims,
        Err(reason) => {
            normalize_timing(verification_start).await;
            return reject(&ctx, method, path, reason, None, None, None);
        }
    };
    ctx.claims = Some(claims.clone());

    let revoked = state
        .revocation
        .is_revoked(state.store.as_ref(), claims.license_id())
        .await;
    normalize_timing(verification_start).await;
    if revoked {
        return reject(&ctx, method, path, RejectionReason::Revoked, None, None, None);
    }

    // D. Rate Limiter. Pillar-less paths (e.g. `/api/health`) have no
    // per-pillar ceiling to enforce and skip this stage entirely.
    if let Some(pillar) = Pillar::from_path(path) {
        let outcome =
            RateLimiter::allow(state.store.as_ref(), claims.license_id(), pillar, claims.rate_tier())
                .await;
        ctx.rate_limit = Some(outcome.headers);
        if !outcome.admitted {
            return reject(
                &ctx,
                method,
                path,
                RejectionReason::RateLimited,
                outcome.retry_after,
                Some(outcome.headers),
                Some(claims.rate_tier()),
            );
        }
    }

    // E. Policy Gate: type-specific scope/expiry/domain rules, then
    // per-resource quota enforcement for PL claims.
    let policy_outcome = match crate::policy::evaluate(
        &claims,
        method,
        path,
        host,
        now,
        state.config.grace_period,
        &state.routes,
    ) {
        Ok(outcome) => outcome,
        Err(reason) => return reject(&ctx, method, path, reason, None, None, None),
    };
    if let Some(warning) = policy_outcome.quota_warning {
        ctx.quota_warning = Some(warning);
    }

    if let LicenseClaims::Pl(pl) = &claims {
        if let Some(resource) = state.resource_for(method, path) {
            let period = period_for(now);
            match quota::check_quota(
                state.store.as_ref(),
                pl,
                resource,
                &period,
                idempotency_key,
                &state.config.overage_rates,
            )
            .await
            {
                Ok(outcome) => {
                    if let Some(warning) = outcome.quota_warning {
                        ctx.quota_warning = Some(warning);
                    }
                }
                Err(RejectionReason::RateLimited) => {
                    return reject(
                        &ctx,
                        method,
                        path,
                        RejectionReason::RateLimited,
                        Some(THROTTLE_RETRY_AFTER_SECONDS),
                        ctx.rate_limit,
                        Some(claims.rate_tier()),
                    );
                }
                Err(RejectionReason::PaymentRequired) => {
                    return reject(
                        &ctx,
                        method,
                        path,
                        RejectionReason::PaymentRequired,
                        None,
                        ctx.rate_limit,
                        Some(claims.rate_tier()),
                    );
                }
                Err(reason) => return reject(&ctx, method, path, reason, None, None, None),
            }
        }
    }

    ctx.idempotency_key = idempotency_key.map(str::to_owned);
    Decision::Admit(ctx)
}

/// The `YYYYMM` bucket a Unix timestamp falls into, used to key the monthly
/// usage counter (spec §3, "Monthly Usage Counter").
fn period_for(now: i64) -> String {
    DateTime::from_timestamp(now, 0)
        .map(|dt| dt.format("%Y%m").to_string())
        .unwrap_or_else(|| "197001".to_owned())
}

/// Convenience wrapper used by the tower middleware: resolves `now` from the
/// wall clock rather than threading it through from the caller.
pub async fn evaluate_now(
    state: &Arc<GatewayState>,
    method: &str,
    path: &str,
    host: Option<&str>,
    license_token: Option<&str>,
    idempotency_key: Option<&str>,
    correlation_id: CorrelationId,
) -> Decision<RequestContext> {
    let now = chrono::Utc::now().timestamp();
    evaluate(
        state,
        method,
        path,
        host,
        license_token,
        idempotency_key,
        correlation_id,
        now,
    )
    .await
}
