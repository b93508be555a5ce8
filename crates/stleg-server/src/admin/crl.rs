use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use stleg_revocation::RevocationRecord;

use super::schemas::{CrlCheckResponse, CrlListEntry, CrlListResponse, CrlStatsResponse, RevokeRequest, RevokeResponse, UnrevokeResponse};
use crate::error::ServerError;
use crate::state::AppState;

/// `POST /admin/crl/revoke/{license_id}` -- adds to the revocation store and
/// marks the Bloom filter stale.
#[utoipa::path(
    post,
    path = "/admin/crl/revoke/{license_id}",
    tag = "Revocation",
    summary = "Revoke a license",
    request_body = RevokeRequest,
    responses((status = 200, description = "License revoked", body = RevokeResponse))
)]
pub async fn revoke(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
    Json(body): Json<RevokeRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let record = RevocationRecord {
        reason: body.reason,
        revoked_by: body.revoked_by,
        notes: body.notes,
        revoked_at: chrono::Utc::now().timestamp(),
    };
    state
        .gateway
        .revocation
        .revoke(state.gateway.store.as_ref(), &license_id, &record)
        .await
        .map_err(|e| ServerError::Store(e.to_string()))?;
    Ok(Json(RevokeResponse {
        license_id,
        revoked: true,
    }))
}

/// `DELETE /admin/crl/revoke/{license_id}` -- removes from the revocation
/// store; marks the Bloom filter stale.
#[utoipa::path(
    delete,
    path = "/admin/crl/revoke/{license_id}",
    tag = "Revocation",
    summary = "Un-revoke a license",
    responses((status = 200, description = "Revocation removed", body = UnrevokeResponse))
)]
pub async fn unrevoke(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let removed = state
        .gateway
        .revocation
        .unrevoke(state.gateway.store.as_ref(), &license_id)
        .await
        .map_err(|e| ServerError::Store(e.to_string()))?;
    Ok(Json(UnrevokeResponse { license_id, removed }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    include_metadata: bool,
}

/// `GET /admin/crl/list?include_metadata=bool` -- enumerates revoked
/// identifiers, bypassing the Bloom filter entirely.
#[utoipa::path(
    get,
    path = "/admin/crl/list",
    tag = "Revocation",
    summary = "List revoked licenses",
    params(("include_metadata" = Option<bool>, Query, description = "Include reason/operator/timestamp for each entry")),
    responses((status = 200, description = "Revoked license list", body = CrlListResponse))
)]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let revoked = if query.include_metadata {
        state
            .gateway
            .revocation
            .list_revoked_with_metadata(state.gateway.store.as_ref())
            .await
            .map_err(|e| ServerError::Store(e.to_string()))?
            .into_iter()
            .map(|(license_id, record)| CrlListEntry {
                license_id,
                reason: Some(record.reason),
                revoked_by: Some(record.revoked_by),
                notes: record.notes,
                revoked_at: Some(record.revoked_at),
            })
            .collect()
    } else {
        state
            .gateway
            .revocation
            .list_revoked(state.gateway.store.as_ref())
            .await
            .map_err(|e| ServerError::Store(e.to_string()))?
            .into_iter()
            .map(|license_id| CrlListEntry {
                license_id,
                reason: None,
                revoked_by: None,
                notes: None,
                revoked_at: None,
            })
            .collect()
    };
    Ok(Json(CrlListResponse { revoked }))
}

/// `GET /admin/crl/check/{license_id}` -- direct store lookup, bypassing the
/// Bloom filter.
#[utoipa::path(
    get,
    path = "/admin/crl/check/{license_id}",
    tag = "Revocation",
    summary = "Check a single license's revocation status",
    responses((status = 200, description = "Revocation status", body = CrlCheckResponse))
)]
pub async fn check(
    State(state): State<AppState>,
    Path(license_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let metadata = state
        .gateway
        .revocation
        .lookup_metadata(state.gateway.store.as_ref(), &license_id)
        .await
        .map_err(|e| ServerError::Store(e.to_string()))?;
    let response = match metadata {
        Some(record) => CrlCheckResponse {
            license_id,
            revoked: true,
            reason: Some(record.reason),
            revoked_by: Some(record.revoked_by),
            revoked_at: Some(record.revoked_at),
        },
        None => CrlCheckResponse {
            license_id,
            revoked: false,
            reason: None,
            revoked_by: None,
            revoked_at: None,
        },
    };
    Ok(Json(response))
}

/// `GET /admin/crl/stats` -- Bloom filter statistics.
#[utoipa::path(
    get,
    path = "/admin/crl/stats",
    tag = "Revocation",
    summary = "Bloom filter statistics",
    responses((status = 200, description = "Revocation cache statistics", body = CrlStatsResponse))
)]
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.gateway.revocation.get_stats();
    Json(CrlStatsResponse {
        total_checks: stats.total_checks,
        fast_path_negatives: stats.fast_path_negatives,
        bloom_positives: stats.bloom_positives,
        confirmed_false_positives: stats.confirmed_false_positives,
        rebuild_count: stats.rebuild_count,
        membership_count: stats.membership_count,
    })
}
