use std::collections::HashMap;
use std::sync::Arc;

use stleg_core::RouteClassifier;
use stleg_crypto::TokenVerifier;
use stleg_revocation::BloomCrl;
use stleg_state::StateStore;

use crate::admission::AdmissionController;
use crate::config::PipelineConfig;

/// Everything the admission pipeline needs, assembled once at startup and
/// shared (via `Arc`) across every request.
pub struct GatewayState {
    pub verifier: Arc<TokenVerifier>,
    pub revocation: Arc<BloomCrl>,
    pub store: Arc<dyn StateStore>,
    pub routes: Arc<RouteClassifier>,
    pub admission: Arc<AdmissionController>,
    pub config: PipelineConfig,
    /// `"METHOD:path-prefix" -> resource name`, consulted only for PL
    /// claims to decide whether a request meters a resource (spec §4.E
    /// leaves endpoint-to-resource mapping to the deployment).
    pub metered_routes: HashMap<String, String>,
}

impl GatewayState {
    #[must_use]
    pub fn resource_for(&self, method: &str, path: &str) -> Option<&str> {
        self.metered_routes.iter().find_map(|(route, resource)| {
            let (route_method, prefix) = route.split_once(':')?;
            if route_method.eq_ignore_ascii_case(method) && path.starts_with(prefix) {
                Some(resource.as_str())
            } else {
                None
            }
        })
    }
}
