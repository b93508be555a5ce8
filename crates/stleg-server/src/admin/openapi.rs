use super::schemas::{
    CrlCheckResponse, CrlListEntry, CrlListResponse, CrlStatsResponse, HealthResponse,
    RateLimitResetRequest, RateLimitResetResponse, ReadyResponse, RevokeRequest, RevokeResponse,
    UnrevokeResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "License Enforcement Gateway - Administrative API",
        version = "0.1.0",
        description = "Revocation, rate-limit, and health-probe endpoints for operating the gateway. Distinct from the license pipeline itself: authenticated with a separate admin bearer token.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Revocation", description = "Bloom-backed revocation cache administration"),
        (name = "Rate Limit", description = "Per-license rate-limit counter administration"),
        (name = "Health", description = "Liveness and readiness probes"),
    ),
    paths(
        super::crl::revoke,
        super::crl::unrevoke,
        super::crl::list,
        super::crl::check,
        super::crl::stats,
        super::ratelimit::reset,
        super::health::healthz,
        super::health::readyz,
    ),
    components(schemas(
        RevokeRequest,
        RevokeResponse,
        UnrevokeResponse,
        CrlListEntry,
        CrlListResponse,
        CrlCheckResponse,
        CrlStatsResponse,
        RateLimitResetRequest,
        RateLimitResetResponse,
        HealthResponse,
        ReadyResponse,
    ))
)]
pub struct ApiDoc;
