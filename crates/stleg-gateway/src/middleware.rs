use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use stleg_core::{CorrelationId, Decision};
use tower::{Layer, Service};

use crate::pipeline;
use crate::state::GatewayState;

/// Tower layer wrapping the admission pipeline. Replaces the source's three
/// separate middlewares (auth, rate limit, priority queue) with one pass
/// over a single `GatewayState`.
#[derive(Clone)]
pub struct GatewayLayer {
    state: Arc<GatewayState>,
}

impl GatewayLayer {
    #[must_use]
    pub fn new(state: Arc<GatewayState>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for GatewayLayer {
    type Service = GatewayMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GatewayMiddleware<S> {
    inner: S,
    state: Arc<GatewayState>,
}

impl<S> Service<Request<Body>> for GatewayMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        let method = req.method().as_str().to_owned();
        let path = req.uri().path().to_owned();
        let host = header_str(&req, header::HOST.as_str()).map(str::to_owned);
        let correlation_id = header_str(&req, "x-correlation-id")
            .map(CorrelationId::from_header)
            .unwrap_or_else(CorrelationId::generate);
        let license_token = license_token(&req);
        let idempotency_key = header_str(&req, "idempotency-key").map(str::to_owned);

        Box::pin(async move {
            let decision = pipeline::evaluate_now(
                &state,
                &method,
                &path,
                host.as_deref(),
                license_token.as_deref(),
                idempotency_key.as_deref(),
                correlation_id,
            )
            .await;

            match decision {
                Decision::Admit(ctx) => {
                    let tier = ctx.claims.as_ref().and_then(|c| c.as_pl().map(|pl| pl.tier));
                    let _permit = state.admission.acquire(tier).await;
                    let response = inner.call(req).await?;
                    Ok(enrich_response(response, &ctx))
                }
                Decision::Continue(_) => {
                    unreachable!("the admission pipeline never yields Continue at its outer boundary")
                }
                Decision::Reject {
                    reason,
                    retry_after,
                    rate_limit,
                    tier,
                } => Ok(rejection_response(reason, retry_after, rate_limit, tier)),
            }
        })
    }
}

fn header_str<'a>(req: &'a Request<Body>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Spec §6.2: the license token rides in `x-st-license` or a standard
/// bearer `Authorization` header, checked in that order.
fn license_token(req: &Request<Body>) -> Option<String> {
    if let Some(token) = header_str(req, "x-st-license") {
        return Some(token.to_owned());
    }
    header_str(req, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn enrich_response(response: Response, ctx: &stleg_core::RequestContext) -> Response {
    let (mut parts, body) = response.into_parts();
    let headers = &mut parts.headers;

    if let Some(correlation_id) = &ctx.correlation_id {
        if let Ok(value) = correlation_id.as_str().parse() {
            headers.insert("X-Correlation-ID", value);
        }
    }
    if let Some(claims) = &ctx.claims {
        headers.insert("X-License-Type", claims.type_name().parse().expect("ascii literal"));
        if let Ok(value) = claims.license_id().parse() {
            headers.insert("X-License-Id", value);
        }
        if let Some(org) = claims.org() {
            if let Ok(value) = org.parse() {
                headers.insert("X-License-Org", value);
            }
        }
        if let Some(tier) = claims.tier_name() {
            headers.insert("X-License-Tier", tier.parse().expect("ascii literal"));
        }
    }
    if let Some(warning) = &ctx.quota_warning {
        if let Ok(value) = warning.parse() {
            headers.insert("X-Quota-Warning", value);
        }
    }
    if let Some(rate_limit) = ctx.rate_limit {
        headers.insert("X-RateLimit-Limit", rate_limit.limit.into());
        headers.insert("X-RateLimit-Remaining", rate_limit.remaining.into());
        headers.insert("X-RateLimit-Reset", rate_limit.reset.into());
    }

    Response::from_parts(parts, body)
}

/// Build the client-facing error response for a terminal rejection (spec
/// §4, §7): the gateway's own JSON body, never the downstream handler's.
/// 401/403 bodies carry only the stable error code and a short human
/// message; 429/402 additionally carry upgrade guidance (current tier,
/// next tier, its limit) when the rejection occurred against a known tier.
fn rejection_response(
    reason: stleg_core::RejectionReason,
    retry_after: Option<u64>,
    rate_limit: Option<stleg_core::RateLimitHeaders>,
    tier: Option<stleg_core::RateTier>,
) -> Response {
    let status = StatusCode::from_u16(reason.status_code()).unwrap_or(StatusCode::FORBIDDEN);
    let mut body = serde_json::json!({
        "error": reason.code(),
        "message": reason.message(),
    });
    if matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED) {
        if let Some(tier) = tier {
            body["upgrade"] = upgrade_guidance(tier);
        }
    }
    let mut response = (status, axum::Json(body)).into_response();
    if let Some(retry_after) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, retry_after.into());
    }
    if let Some(rate_limit) = rate_limit {
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", rate_limit.limit.into());
        headers.insert("X-RateLimit-Remaining", rate_limit.remaining.into());
        headers.insert("X-RateLimit-Reset", rate_limit.reset.into());
    }
    response
}

/// `{current_tier, next_tier, next_tier_limit}` guidance accompanying a
/// 429/402 body, or a top-tier-reached shape when `tier` is already `PL-E`.
fn upgrade_guidance(tier: stleg_core::RateTier) -> serde_json::Value {
    match tier.next() {
        Some(next) => serde_json::json!({
            "current_tier": tier.as_str(),
            "next_tier": next.as_str(),
            "next_tier_limit": next.ceiling(),
        }),
        None => serde_json::json!({
            "current_tier": tier.as_str(),
            "next_tier": serde_json::Value::Null,
            "next_tier_limit": serde_json::Value::Null,
        }),
    }
}
