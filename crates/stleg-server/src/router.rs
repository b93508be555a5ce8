use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::admin::auth::require_admin_token;
use crate::admin::openapi::ApiDoc;
use crate::admin::{crl, health, ratelimit};
use crate::proxy;
use crate::state::AppState;
use stleg_gateway::GatewayLayer;

/// Assemble the full router: the liveness probe stays unauthenticated (a
/// load balancer must be able to reach it before an admin token is even
/// configured), every other `/admin/*` route sits behind
/// `require_admin_token`, and the license pipeline (`GatewayLayer`) gates
/// only the reverse-proxied application surface, never the admin API.
pub fn build(state: AppState) -> Router {
    let public = Router::new()
        .route("/admin/healthz", get(health::healthz))
        .route("/admin/readyz", get(health::readyz));

    let admin = Router::new()
        .route("/admin/crl/revoke/{license_id}", post(crl::revoke))
        .route("/admin/crl/revoke/{license_id}", delete(crl::unrevoke))
        .route("/admin/crl/list", get(crl::list))
        .route("/admin/crl/check/{license_id}", get(crl::check))
        .route("/admin/crl/stats", get(crl::stats))
        .route("/admin/ratelimit/reset/{license_id}", post(ratelimit::reset))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin_token));

    let proxied = Router::new()
        .fallback(proxy::forward)
        .layer(GatewayLayer::new(state.gateway.clone()));

    Router::new()
        .merge(public)
        .merge(admin)
        .merge(proxied)
        .merge(SwaggerUi::new("/admin/swagger-ui").url("/admin/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
