use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::StateError;
use crate::store::StateStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

fn expiry_from_ttl(ttl_seconds: Option<u64>) -> Option<Instant> {
    ttl_seconds.map(|s| Instant::now() + Duration::from_secs(s))
}

/// In-memory `StateStore` backed by a `DashMap`, with lazy TTL eviction on
/// read. This is the reference implementation used by tests and by
/// single-node deployments; production deployments inject a durable
/// backend implementing the same trait.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    data: DashMap<String, Entry>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn incr(&self, key: &str) -> Result<i64, StateError> {
        self.data.remove_if(key, |_, entry| entry.is_expired());

        let mut entry = self.data.entry(key.to_owned()).or_insert_with(|| Entry {
            value: "0".to_owned(),
            expires_at: None,
        });

        let current: i64 = entry
            .value
            .parse()
            .map_err(|e: std::num::ParseIntError| StateError::NotACounter(e.to_string()))?;
        let new_value = current + 1;
        entry.value = new_value.to_string();
        Ok(new_value)
    }

    async fn set_ttl(&self, key: &str, seconds: u64) -> Result<(), StateError> {
        if let Some(mut entry) = self.data.get_mut(key) {
            entry.expires_at = expiry_from_ttl(Some(seconds));
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, StateError> {
        let Some(entry) = self.data.get(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            return Ok(None);
        }
        Ok(entry
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()).as_secs()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let Some(entry) = self.data.get(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            drop(entry);
            self.data.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), StateError> {
        self.data.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: expiry_from_ttl(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn check_and_set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<bool, StateError> {
        self.data.remove_if(key, |_, entry| entry.is_expired());

        match self.data.entry(key.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Entry {
                    value: value.to_owned(),
                    expires_at: expiry_from_ttl(ttl_seconds),
                });
                Ok(true)
            }
        }
    }

    async fn del(&self, key: &str) -> Result<bool, StateError> {
        match self.data.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StateError> {
        let mut results = Vec::new();
        for item in &self.data {
            if item.key().starts_with(prefix) && !item.value().is_expired() {
                results.push((item.key().clone(), item.value().value.clone()));
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_creates_and_increments() {
        let store = MemoryStateStore::new();
        assert_eq!(store.incr("a").await.unwrap(), 1);
        assert_eq!(store.incr("a").await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_via_get() {
        let store = MemoryStateStore::new();
        store.set("k", "v", Some(5)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn check_and_set_allows_recreation_after_expiry() {
        let store = MemoryStateStore::new();
        assert!(store.check_and_set("k", "v1", Some(2)).await.unwrap());
        assert!(!store.check_and_set("k", "v2", None).await.unwrap());
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(store.check_and_set("k", "v2", None).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn scan_prefix_filters_by_key() {
        let store = MemoryStateStore::new();
        store.set("ratelimit:lic-a:seaside", "1", None).await.unwrap();
        store.set("ratelimit:lic-a:deckside", "1", None).await.unwrap();
        store.set("revocation:lic-b", "1", None).await.unwrap();
        let matched = store.scan_prefix("ratelimit:lic-a:").await.unwrap();
        assert_eq!(matched.len(), 2);
    }

    #[tokio::test]
    async fn del_returns_false_for_missing() {
        let store = MemoryStateStore::new();
        assert!(!store.del("missing").await.unwrap());
    }
}
