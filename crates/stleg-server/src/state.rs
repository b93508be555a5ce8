use std::sync::Arc;

use secrecy::SecretString;
use stleg_gateway::GatewayState;

/// Shared application state passed to every handler: the gateway's own
/// state (verifier, revocation, store, routes, admission) plus the
/// administrative credential, which deliberately lives outside
/// `GatewayState` since it authenticates a different caller population and
/// never participates in the license pipeline (this mirrors the separation
/// between the admin API of §6.6 and the license pipeline it guards).
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
    /// Redacted in `Debug` output and logs; see [`secrecy::SecretString`].
    pub admin_token_hash: SecretString,
    pub upstream_base_url: String,
    pub upstream_timeout_seconds: u64,
    /// Reused across requests rather than built per-call, the way the
    /// teacher's provider clients hold one `reqwest::Client` each.
    pub upstream_client: reqwest::Client,
}
