use crate::claims::RateTier;
use crate::context::RateLimitHeaders;
use crate::error::RejectionReason;

/// The uniform contract every pipeline stage implements: `(request, context)
/// -> Decision`. Collapses what used to be several near-duplicate
/// middlewares into one composable chain of stages that each return one of
/// these three outcomes.
#[derive(Debug, Clone)]
pub enum Decision<T> {
    /// Terminal success: stop the pipeline and admit the request.
    Admit(T),
    /// Non-terminal success: carry the (possibly updated) context into the
    /// next stage.
    Continue(T),
    /// Terminal failure: stop the pipeline and reject with this reason. An
    /// optional `Retry-After` value (seconds) accompanies 429/402 outcomes.
    /// `rate_limit`, when set, is echoed as `X-RateLimit-*` headers even on
    /// rejection (spec §4.D step 5: a 429 still reports `remaining=0`).
    /// `tier`, when set, is the rejected request's current rate tier, used
    /// to compose the upgrade guidance spec §7 requires on 429/402 bodies.
    Reject {
        reason: RejectionReason,
        retry_after: Option<u64>,
        rate_limit: Option<RateLimitHeaders>,
        tier: Option<RateTier>,
    },
}

impl<T> Decision<T> {
    #[must_use]
    pub fn reject(reason: RejectionReason) -> Self {
        Self::Reject {
            reason,
            retry_after: None,
            rate_limit: None,
            tier: None,
        }
    }

    #[must_use]
    pub fn reject_with_retry(reason: RejectionReason, retry_after: u64) -> Self {
        Self::Reject {
            reason,
            retry_after: Some(retry_after),
            rate_limit: None,
            tier: None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Admit(_) | Self::Reject { .. })
    }
}
