use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use stleg_core::Pillar;
use stleg_ratelimit::RateLimiter;

use super::schemas::{RateLimitResetRequest, RateLimitResetResponse};
use crate::error::ServerError;
use crate::state::AppState;

/// `POST /admin/ratelimit/reset/{license_id}` -- clears a license's counter
/// for one pillar, or every pillar when `pillar` is omitted (spec §4.D,
/// "ambient operational affordance").
#[utoipa::path(
    post,
    path = "/admin/ratelimit/reset/{license_id}",
    tag = "Rate Limit",
    summary = "Reset a license's rate-limit counters",
    request_body = RateLimitResetRequest,
    responses((status = 200, description = "Counters reset", body = RateLimitResetResponse))
)]
pub async fn reset(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
    Json(body): Json<RateLimitResetRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let pillar = match body.pillar.as_deref() {
        Some(raw) => Some(
            Pillar::from_segment(&raw.to_lowercase())
                .ok_or_else(|| ServerError::Config(format!("unknown pillar {raw}")))?,
        ),
        None => None,
    };

    RateLimiter::reset(state.gateway.store.as_ref(), &license_id, pillar).await;
    Ok(Json(RateLimitResetResponse {
        license_id,
        reset: true,
    }))
}
