use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::schemas::{HealthResponse, ReadyResponse};
use crate::state::AppState;

/// `GET /admin/healthz` -- liveness. Never depends on downstream state: if
/// the process can answer, it's alive.
#[utoipa::path(
    get,
    path = "/admin/healthz",
    tag = "Health",
    summary = "Liveness probe",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_owned(),
    })
}

/// `GET /admin/readyz` -- readiness: the Key Directory holds at least one
/// key and the revocation Bloom filter has completed its first build.
#[utoipa::path(
    get,
    path = "/admin/readyz",
    tag = "Health",
    summary = "Readiness probe",
    responses(
        (status = 200, description = "Ready to serve traffic", body = ReadyResponse),
        (status = 503, description = "Not yet ready", body = ReadyResponse),
    )
)]
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let key_directory_loaded = state.gateway.verifier.is_ready();
    let revocation_bloom_initialized = state.gateway.revocation.is_initialized();
    let ready = key_directory_loaded && revocation_bloom_initialized;

    let body = ReadyResponse {
        status: if ready { "ready".to_owned() } else { "not_ready".to_owned() },
        key_directory_loaded,
        revocation_bloom_initialized,
    };
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}
