use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;

/// Schema for the server's TOML configuration file. Every section carries
/// its own defaults so an empty file (or a file missing a section) still
/// produces a runnable configuration, mirroring the rest of the ambient
/// corpus's file-plus-flag-overrides layering.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub admin: AdminSection,
    #[serde(default)]
    pub keys: KeysSection,
    #[serde(default)]
    pub revocation: RevocationSection,
    #[serde(default)]
    pub admission: AdmissionSection,
    #[serde(default)]
    pub grace_period: GracePeriodSection,
    #[serde(default)]
    pub overage_rates: HashMap<String, f64>,
    #[serde(default)]
    pub metered_routes: Vec<MeteredRoute>,
    #[serde(default)]
    pub public_routes: Vec<PublicRoute>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

/// Where requests admitted by the pipeline are forwarded. The gateway never
/// interprets the downstream API's own semantics -- it only decides
/// admit/reject and then hands the request on unchanged.
#[derive(Debug, Deserialize)]
pub struct UpstreamSection {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    #[serde(default = "default_upstream_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            timeout_seconds: default_upstream_timeout_seconds(),
        }
    }
}

fn default_upstream_base_url() -> String {
    "http://127.0.0.1:9000".to_owned()
}

fn default_upstream_timeout_seconds() -> u64 {
    30
}

/// Administrative bearer-token auth. `token_hash` is the lowercase-hex
/// SHA-256 of the raw admin token, produced offline with
/// [`crate::admin::auth::hash_admin_token`]; left empty, every admin
/// request is rejected — there is no "auth disabled" mode for the
/// administrative surface.
///
/// Wrapped in [`SecretString`] so it is redacted in logs and `Debug` output.
#[derive(Debug, Deserialize)]
pub struct AdminSection {
    #[serde(default = "default_token_hash")]
    pub token_hash: SecretString,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            token_hash: default_token_hash(),
        }
    }
}

fn default_token_hash() -> SecretString {
    SecretString::from(String::new())
}

/// Where the Key Directory source file lives and whether to watch it.
#[derive(Debug, Deserialize)]
pub struct KeysSection {
    #[serde(default = "default_keys_path")]
    pub path: String,
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            path: default_keys_path(),
            watch: default_true(),
        }
    }
}

fn default_keys_path() -> String {
    "keys.toml".to_owned()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RevocationSection {
    /// Optional seed file of license ids to revoke at startup and on every
    /// hot-reload; the seed is additive (never un-revokes), so editing it
    /// down never accidentally restores a license.
    #[serde(default)]
    pub seed_path: Option<String>,
    #[serde(default = "default_true")]
    pub watch: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_bloom_capacity")]
    pub bloom_capacity: usize,
    #[serde(default = "default_bloom_fp_rate")]
    pub bloom_false_positive_rate: f64,
}

impl Default for RevocationSection {
    fn default() -> Self {
        Self {
            seed_path: None,
            watch: default_true(),
            refresh_interval_seconds: default_refresh_interval(),
            bloom_capacity: default_bloom_capacity(),
            bloom_false_positive_rate: default_bloom_fp_rate(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_bloom_capacity() -> usize {
    100_000
}

fn default_bloom_fp_rate() -> f64 {
    1e-4
}

#[derive(Debug, Deserialize)]
pub struct AdmissionSection {
    #[serde(default = "default_admission_permits")]
    pub permits: usize,
    #[serde(default)]
    pub sponsor_permits: Option<usize>,
    #[serde(default)]
    pub free_permits: Option<usize>,
}

impl Default for AdmissionSection {
    fn default() -> Self {
        Self {
            permits: default_admission_permits(),
            sponsor_permits: None,
            free_permits: None,
        }
    }
}

fn default_admission_permits() -> usize {
    200
}

#[derive(Debug, Deserialize)]
pub struct GracePeriodSection {
    #[serde(default = "default_grace_days")]
    pub days: u64,
}

impl Default for GracePeriodSection {
    fn default() -> Self {
        Self {
            days: default_grace_days(),
        }
    }
}

fn default_grace_days() -> u64 {
    14
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteredRoute {
    pub method: String,
    pub path_prefix: String,
    pub resource: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicRoute {
    pub method: String,
    pub path: String,
}

/// Load the configuration from `path`, or fall back to an all-defaults
/// configuration if the file does not exist — matching the teacher's
/// "file found? parse it : `toml::from_str("")`" pattern.
pub fn load(path: &std::path::Path) -> Result<ServerConfig, crate::error::ServerError> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::error::ServerError::Config(format!("failed to parse {}: {e}", path.display())))
    } else {
        toml::from_str("").map_err(|e| crate::error::ServerError::Config(e.to_string()))
    }
}
