use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

/// The thin reverse-proxy handler fronted by `GatewayLayer`: by the time a
/// request reaches here the pipeline has already admitted it, so this just
/// forwards method, path, query, headers, and body to the configured
/// upstream and relays the response back unchanged. The seafood-traceability
/// API itself lives entirely in the upstream process; this gateway never
/// knows its routes beyond what `RouteClassifier` and `metered_routes` name.
pub async fn forward(
    State(state): State<AppState>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = format!("{}{}", state.upstream_base_url, uri);

    let mut request = state
        .upstream_client
        .request(method, &target)
        .timeout(Duration::from_secs(state.upstream_timeout_seconds))
        .body(body);

    for (name, value) in &headers {
        if name == axum::http::header::HOST {
            continue;
        }
        request = request.header(name, value);
    }

    match request.send().await {
        Ok(upstream_response) => {
            let status = upstream_response.status();
            let mut response_headers = HeaderMap::new();
            for (name, value) in upstream_response.headers() {
                response_headers.insert(name, value.clone());
            }
            let body = upstream_response
                .bytes()
                .await
                .unwrap_or_else(|_| Bytes::new());

            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(err) => {
            warn!(error = %err, target, "upstream request failed");
            (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
        }
    }
}
