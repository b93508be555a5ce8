use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::error::ServerError;
use crate::state::AppState;

/// SHA-256 hex digest of a raw admin token, matching the configured
/// `admin.token_hash` (grounded on the teacher's `hash_api_key`: the
/// administrative surface here is a single fixed credential per
/// deployment, not a multi-user table, so there is no lookup map — just an
/// equality check against one configured hash).
pub fn hash_admin_token(raw_token: &str) -> SecretString {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    SecretString::from(hex::encode(hasher.finalize()))
}

fn authenticate(raw_token: &str, configured_hash: &SecretString) -> bool {
    let configured_hash = configured_hash.expose_secret();
    !configured_hash.is_empty() && hash_admin_token(raw_token).expose_secret() == configured_hash
}

/// `axum::middleware::from_fn_with_state` guard placed in front of every
/// `/admin/*` route except the liveness probe. A missing or wrong bearer
/// token never reaches a handler.
pub async fn require_admin_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if authenticate(token, &state.admin_token_hash) => Ok(next.run(req).await),
        _ => Err(ServerError::Unauthorized("missing or invalid admin token".to_owned())),
    }
}
