use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::VerifyingKey;
use serde::Deserialize;
use stleg_crypto::{CryptoError, KeyDirectory, KeyDirectorySource, KeyEntry, KeyStatus};

use crate::error::ServerError;
use crate::watcher::Reloadable;

/// Wire format of the Key Directory source file (spec §6.5: "produces
/// `[{kid, public_key_32_bytes, status}]`, read-only, polled"). Public keys
/// are stored as lowercase hex rather than base64 to match the rest of the
/// corpus's hex-for-raw-bytes convention (`acteon-gateway`'s
/// `approval_keys` config does the same for its HMAC secrets).
#[derive(Debug, Deserialize)]
struct KeysFile {
    #[serde(default)]
    keys: Vec<KeyFileEntry>,
}

#[derive(Debug, Deserialize)]
struct KeyFileEntry {
    kid: String,
    public_key: String,
    status: KeyFileStatus,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KeyFileStatus {
    Active,
    Previous,
    Deprecated,
}

impl From<KeyFileStatus> for KeyStatus {
    fn from(status: KeyFileStatus) -> Self {
        match status {
            KeyFileStatus::Active => Self::Active,
            KeyFileStatus::Previous => Self::Previous,
            KeyFileStatus::Deprecated => Self::Deprecated,
        }
    }
}

/// Reads the Key Directory's contents from a TOML file on disk, re-read on
/// every `load()` call so a `notify`-driven watcher (see `watcher.rs`) can
/// trigger a refresh without restarting the process.
pub struct FileKeyDirectorySource {
    path: PathBuf,
}

impl FileKeyDirectorySource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeyDirectorySource for FileKeyDirectorySource {
    async fn load(&self) -> Result<Vec<KeyEntry>, CryptoError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| CryptoError::Source(format!("{}: {e}", self.path.display())))?;
        let file: KeysFile = toml::from_str(&contents)
            .map_err(|e| CryptoError::Source(format!("failed to parse {}: {e}", self.path.display())))?;

        file.keys
            .into_iter()
            .map(|entry| {
                let bytes = hex::decode(&entry.public_key)
                    .map_err(|_| CryptoError::InvalidKey(entry.kid.clone()))?;
                let bytes: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| CryptoError::InvalidKey(entry.kid.clone()))?;
                let public_key = VerifyingKey::from_bytes(&bytes)
                    .map_err(|_| CryptoError::InvalidKey(entry.kid.clone()))?;
                Ok(KeyEntry {
                    kid: entry.kid,
                    public_key,
                    status: entry.status.into(),
                })
            })
            .collect()
    }
}

/// `Reloadable` target for `ConfigWatcher`: re-polls the key file and
/// publishes the new snapshot into the `KeyDirectory`.
pub struct KeyDirectoryReload {
    directory: Arc<KeyDirectory>,
    source: Arc<FileKeyDirectorySource>,
}

impl KeyDirectoryReload {
    #[must_use]
    pub fn new(directory: Arc<KeyDirectory>, source: Arc<FileKeyDirectorySource>) -> Self {
        Self { directory, source }
    }
}

#[async_trait]
impl Reloadable for KeyDirectoryReload {
    async fn reload(&self) -> Result<(), ServerError> {
        self.directory
            .refresh(self.source.as_ref())
            .await
            .map_err(|e| ServerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use rand_core::OsRng;

    use super::*;

    #[tokio::test]
    async fn loads_well_formed_entries() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let hex_key = hex::encode(signing_key.verifying_key().to_bytes());
        let dir = tempfile_dir("loads-well-formed-entries");
        let path = dir.join("keys.toml");
        std::fs::write(
            &path,
            format!(
                "[[keys]]\nkid = \"k1\"\npublic_key = \"{hex_key}\"\nstatus = \"active\"\n"
            ),
        )
        .unwrap();

        let source = FileKeyDirectorySource::new(&path);
        let entries = source.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kid, "k1");
        assert_eq!(entries[0].status, KeyStatus::Active);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn rejects_malformed_hex() {
        let dir = tempfile_dir("rejects-malformed-hex");
        let path = dir.join("keys.toml");
        std::fs::write(
            &path,
            "[[keys]]\nkid = \"k1\"\npublic_key = \"not-hex\"\nstatus = \"active\"\n",
        )
        .unwrap();

        let source = FileKeyDirectorySource::new(&path);
        assert!(source.load().await.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempfile_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stleg-server-test-{}-{label}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
