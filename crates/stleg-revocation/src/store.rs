use stleg_state::StateStore;

use crate::error::RevocationError;

const KEY_PREFIX: &str = "revocation:";

fn key_for(license_id: &str) -> String {
    format!("{KEY_PREFIX}{license_id}")
}

/// Metadata recorded alongside a revocation, serialized as the value half of
/// the `revocation:{license_id}` entry in the injected `StateStore`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RevocationRecord {
    pub reason: String,
    pub revoked_by: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub revoked_at: i64,
}

/// Authoritative revocation membership, layered on the shared `StateStore`
/// rather than a bespoke collaborator, per this crate's single-store design
/// (stated in the specification's closing note on §6.5).
pub async fn revoke(
    store: &dyn StateStore,
    license_id: &str,
    record: &RevocationRecord,
) -> Result<(), RevocationError> {
    let value = serde_json::to_string(record).map_err(|e| RevocationError::Store(e.to_string()))?;
    store
        .set(&key_for(license_id), &value, None)
        .await
        .map_err(|e| RevocationError::Store(e.to_string()))
}

pub async fn unrevoke(store: &dyn StateStore, license_id: &str) -> Result<bool, RevocationError> {
    store
        .del(&key_for(license_id))
        .await
        .map_err(|e| RevocationError::Store(e.to_string()))
}

pub async fn is_revoked(store: &dyn StateStore, license_id: &str) -> Result<bool, RevocationError> {
    store
        .get(&key_for(license_id))
        .await
        .map(|v| v.is_some())
        .map_err(|e| RevocationError::Store(e.to_string()))
}

pub async fn list_revoked(store: &dyn StateStore) -> Result<Vec<String>, RevocationError> {
    let entries = store
        .scan_prefix(KEY_PREFIX)
        .await
        .map_err(|e| RevocationError::Store(e.to_string()))?;
    Ok(entries
        .into_iter()
        .filter_map(|(k, _)| k.strip_prefix(KEY_PREFIX).map(str::to_owned))
        .collect())
}

/// Fetch the recorded reason/operator/timestamp for a single revocation, for
/// the admin check endpoint (spec §6.6: `GET /admin/crl/check/{license_id}`).
pub async fn lookup_metadata(
    store: &dyn StateStore,
    license_id: &str,
) -> Result<Option<RevocationRecord>, RevocationError> {
    let Some(raw) = store
        .get(&key_for(license_id))
        .await
        .map_err(|e| RevocationError::Store(e.to_string()))?
    else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| RevocationError::Store(e.to_string()))
}

/// Every revoked license with its metadata, for the admin listing endpoint
/// (spec §6.6: `GET /admin/crl/list`). Entries whose value fails to
/// deserialize are skipped rather than failing the whole listing.
pub async fn enumerate_with_metadata(
    store: &dyn StateStore,
) -> Result<Vec<(String, RevocationRecord)>, RevocationError> {
    let entries = store
        .scan_prefix(KEY_PREFIX)
        .await
        .map_err(|e| RevocationError::Store(e.to_string()))?;
    Ok(entries
        .into_iter()
        .filter_map(|(k, v)| {
            let license_id = k.strip_prefix(KEY_PREFIX)?.to_owned();
            let record: RevocationRecord = serde_json::from_str(&v).ok()?;
            Some((license_id, record))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use stleg_state::MemoryStateStore;

    use super::*;

    fn record() -> RevocationRecord {
        RevocationRecord {
            reason: "fraud".to_owned(),
            revoked_by: "ops@example.com".to_owned(),
            notes: None,
            revoked_at: 1_000,
        }
    }

    #[tokio::test]
    async fn lookup_metadata_returns_none_for_unknown_license() {
        let store = MemoryStateStore::new();
        assert!(lookup_metadata(&store, "lic_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_metadata_roundtrips_the_revocation_record() {
        let store = MemoryStateStore::new();
        revoke(&store, "lic_a", &record()).await.unwrap();
        let found = lookup_metadata(&store, "lic_a").await.unwrap().unwrap();
        assert_eq!(found.reason, "fraud");
        assert_eq!(found.revoked_by, "ops@example.com");
    }

    #[tokio::test]
    async fn enumerate_with_metadata_lists_every_revocation() {
        let store = MemoryStateStore::new();
        revoke(&store, "lic_a", &record()).await.unwrap();
        revoke(&store, "lic_b", &record()).await.unwrap();
        let mut entries = enumerate_with_metadata(&store).await.unwrap();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "lic_a");
        assert_eq!(entries[1].0, "lic_b");
    }
}
