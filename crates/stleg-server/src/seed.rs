use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use stleg_revocation::{BloomCrl, RevocationRecord};
use stleg_state::StateStore;
use tracing::info;

use crate::error::ServerError;
use crate::watcher::Reloadable;

/// Wire format of the revocation seed file: a flat list of license ids an
/// operator wants revoked without going through the admin API. Applying the
/// seed is additive only — entries removed from the file are left revoked,
/// so shrinking the file can never silently un-revoke a license.
#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    revoked: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry {
    license_id: String,
    #[serde(default = "default_reason")]
    reason: String,
    #[serde(default = "default_revoked_by")]
    revoked_by: String,
    #[serde(default)]
    notes: Option<String>,
}

fn default_reason() -> String {
    "seed file".to_owned()
}

fn default_revoked_by() -> String {
    "seed".to_owned()
}

/// `Reloadable` target for `ConfigWatcher`: re-reads the seed file and
/// revokes every listed license id, marking the Bloom filter stale.
pub struct RevocationSeedReload {
    path: PathBuf,
    revocation: Arc<BloomCrl>,
    store: Arc<dyn StateStore>,
}

impl RevocationSeedReload {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, revocation: Arc<BloomCrl>, store: Arc<dyn StateStore>) -> Self {
        Self {
            path: path.into(),
            revocation,
            store,
        }
    }

    pub async fn apply(&self) -> Result<usize, ServerError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", self.path.display())))?;
        let file: SeedFile = toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("failed to parse {}: {e}", self.path.display())))?;

        let count = file.revoked.len();
        for entry in file.revoked {
            let record = RevocationRecord {
                reason: entry.reason,
                revoked_by: entry.revoked_by,
                notes: entry.notes,
                revoked_at: 0,
            };
            self.revocation
                .revoke(self.store.as_ref(), &entry.license_id, &record)
                .await
                .map_err(|e| ServerError::Store(e.to_string()))?;
        }
        info!(count, path = %self.path.display(), "applied revocation seed file");
        Ok(count)
    }
}

#[async_trait]
impl Reloadable for RevocationSeedReload {
    async fn reload(&self) -> Result<(), ServerError> {
        self.apply().await.map(|_| ())
    }
}
