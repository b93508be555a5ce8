use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeRequest {
    pub reason: String,
    pub revoked_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeResponse {
    pub license_id: String,
    pub revoked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnrevokeResponse {
    pub license_id: String,
    pub removed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrlListEntry {
    pub license_id: String,
    pub reason: Option<String>,
    pub revoked_by: Option<String>,
    pub notes: Option<String>,
    pub revoked_at: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrlListResponse {
    pub revoked: Vec<CrlListEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrlCheckResponse {
    pub license_id: String,
    pub revoked: bool,
    pub reason: Option<String>,
    pub revoked_by: Option<String>,
    pub revoked_at: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrlStatsResponse {
    pub total_checks: u64,
    pub fast_path_negatives: u64,
    pub bloom_positives: u64,
    pub confirmed_false_positives: u64,
    pub rebuild_count: u64,
    pub membership_count: usize,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RateLimitResetRequest {
    #[serde(default)]
    pub pillar: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateLimitResetResponse {
    pub license_id: String,
    pub reset: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: String,
    pub key_directory_loaded: bool,
    pub revocation_bloom_initialized: bool,
}
