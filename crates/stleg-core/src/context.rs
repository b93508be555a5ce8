use crate::claims::LicenseClaims;
use crate::correlation::CorrelationId;

/// Rate-limit values computed by the limiter, carried forward so the
/// admission controller can inject them as response headers regardless of
/// which stage produced the final decision.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHeaders {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

/// Per-request state threaded through the pipeline's stages. Each stage
/// reads what prior stages established and may add its own annotations;
/// nothing here is shared mutable across requests.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub correlation_id: Option<CorrelationId>,
    pub claims: Option<LicenseClaims>,
    pub quota_warning: Option<String>,
    pub rate_limit: Option<RateLimitHeaders>,
    pub idempotency_key: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }
}
