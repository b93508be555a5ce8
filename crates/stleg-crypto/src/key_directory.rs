use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use ed25519_dalek::VerifyingKey;

use crate::error::CryptoError;

/// Lifecycle tag on a Key Directory entry. Exactly one `Active` entry and at
/// most one `Previous` entry may be in effect at a time; `Deprecated` keys
/// are retained only so administrators can see rotation history, not for
/// verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Previous,
    Deprecated,
}

#[derive(Debug, Clone)]
pub struct KeyEntry {
    pub kid: String,
    pub public_key: VerifyingKey,
    pub status: KeyStatus,
}

/// Produces the raw Key Directory contents. Implemented by whatever
/// collaborator the deployment polls (a file, a config service, ...); not
/// specified further here (spec §6.5: "read-only, polled").
#[async_trait]
pub trait KeyDirectorySource: Send + Sync {
    async fn load(&self) -> Result<Vec<KeyEntry>, CryptoError>;
}

struct Snapshot {
    by_kid: HashMap<String, KeyEntry>,
    default_active_kid: Option<String>,
}

/// Read-mostly, copy-on-write Key Directory. Readers take an `Arc` snapshot
/// with no locking; the refresh task builds a whole new snapshot and
/// publishes it with a single atomic pointer swap.
pub struct KeyDirectory {
    snapshot: ArcSwap<Snapshot>,
}

impl Default for KeyDirectory {
    fn default() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot {
                by_kid: HashMap::new(),
                default_active_kid: None,
            }),
        }
    }
}

impl KeyDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory already seeded with `entries`, for tests and for a
    /// static/no-rotation deployment.
    #[must_use]
    pub fn seeded(entries: Vec<KeyEntry>) -> Self {
        let directory = Self::new();
        directory.publish(entries);
        directory
    }

    fn publish(&self, entries: Vec<KeyEntry>) {
        let mut by_kid = HashMap::with_capacity(entries.len());
        let mut default_active_kid = None;
        for entry in entries {
            if entry.status == KeyStatus::Active && default_active_kid.is_none() {
                default_active_kid = Some(entry.kid.clone());
            }
            by_kid.insert(entry.kid.clone(), entry);
        }
        self.snapshot.store(Arc::new(Snapshot {
            by_kid,
            default_active_kid,
        }));
    }

    /// Reload from `source`. Atomic: the new directory replaces the old only
    /// if it contains at least one well-formed entry, so a transient empty
    /// or broken source never blanks out a serving directory.
    pub async fn refresh(&self, source: &dyn KeyDirectorySource) -> Result<(), CryptoError> {
        let entries = source.load().await?;
        if entries.is_empty() {
            return Err(CryptoError::EmptyDirectory);
        }
        self.publish(entries);
        Ok(())
    }

    /// Look up a key by `kid`, or fall back to the directory's default
    /// active key if `kid` is absent (spec §4.B: "If missing, a configured
    /// default key is used").
    #[must_use]
    pub fn get(&self, kid: Option<&str>) -> Option<KeyEntry> {
        let snapshot = self.snapshot.load();
        match kid {
            Some(kid) => snapshot.by_kid.get(kid).cloned(),
            None => snapshot
                .default_active_kid
                .as_deref()
                .and_then(|default_kid| snapshot.by_kid.get(default_kid))
                .cloned(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().by_kid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
