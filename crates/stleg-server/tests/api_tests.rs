use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use stleg_core::RouteClassifier;
use stleg_crypto::{KeyDirectory, KeyEntry, KeyStatus, TokenVerifier};
use stleg_gateway::{AdmissionController, GatewayState, PipelineConfig};
use stleg_revocation::{BloomCrl, BloomCrlConfig};
use stleg_server::admin::auth::hash_admin_token;
use stleg_server::state::AppState;
use stleg_state::{MemoryStateStore, StateStore};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "integration-test-token";

fn test_state() -> AppState {
    let signing_key = SigningKey::generate(&mut OsRng);
    let directory = Arc::new(KeyDirectory::seeded(vec![KeyEntry {
        kid: "k1".to_owned(),
        public_key: signing_key.verifying_key(),
        status: KeyStatus::Active,
    }]));
    let verifier = Arc::new(TokenVerifier::new(directory));
    let revocation = Arc::new(BloomCrl::new(BloomCrlConfig::default()));
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let routes = Arc::new(RouteClassifier::new(std::iter::empty::<(String, String)>()));
    let admission = Arc::new(AdmissionController::new(10, None));

    let gateway = Arc::new(GatewayState {
        verifier,
        revocation,
        store,
        routes,
        admission,
        config: PipelineConfig::default(),
        metered_routes: HashMap::new(),
    });

    AppState {
        gateway,
        admin_token_hash: hash_admin_token(ADMIN_TOKEN),
        upstream_base_url: "http://127.0.0.1:1".to_owned(),
        upstream_timeout_seconds: 1,
        upstream_client: reqwest::Client::new(),
    }
}

#[test]
fn admin_token_hash_is_redacted_in_debug_output() {
    use secrecy::ExposeSecret;

    let hash = hash_admin_token(ADMIN_TOKEN);
    let debug_output = format!("{hash:?}");
    assert!(!debug_output.contains(hash.expose_secret()));
}

fn authed_request(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
}

#[tokio::test]
async fn healthz_requires_no_auth() {
    let app = stleg_server::router::build(test_state());
    let response = app
        .oneshot(Request::builder().uri("/admin/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readyz_reports_not_ready_before_revocation_filter_builds() {
    let app = stleg_server::router::build(test_state());
    let response = app
        .oneshot(Request::builder().uri("/admin/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    // The Key Directory is seeded, but the Bloom filter has not yet been
    // built by a first revocation check, so readiness is still false.
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn admin_routes_reject_missing_token() {
    let app = stleg_server::router::build(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/crl/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_wrong_token() {
    let app = stleg_server::router::build(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/crl/stats")
                .header(http::header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_then_check_round_trip() {
    let app = stleg_server::router::build(test_state());

    let revoke_body = serde_json::json!({
        "reason": "fraud",
        "revoked_by": "ops@example.com",
    });
    let response = app
        .clone()
        .oneshot(
            authed_request("POST", "/admin/crl/revoke/lic_test")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(revoke_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(authed_request("GET", "/admin/crl/check/lic_test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["revoked"], serde_json::Value::Bool(true));
}

#[tokio::test]
async fn ratelimit_reset_clears_counter() {
    let app = stleg_server::router::build(test_state());
    let response = app
        .oneshot(
            authed_request("POST", "/admin/ratelimit/reset/lic_test")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
