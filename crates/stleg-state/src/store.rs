use async_trait::async_trait;

use crate::error::StateError;

/// The single storage abstraction injected into the counter store, the
/// idempotency set, and the revocation store (the key directory source is a
/// separate poll collaborator, not a `StateStore`).
///
/// Every method is named after the operation the specification's store
/// contracts name directly, rather than after a generic get/set vocabulary,
/// so callers read as a direct translation of the contract they implement:
/// `incr`/`set_ttl`/`ttl` back the rate limiter, `check_and_set` backs the
/// idempotency set's `add_if_absent`, `get`/`set`/`del`/`scan_prefix` back
/// the revocation store's membership operations.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Atomically increment a counter by 1, creating it at 0 first if
    /// absent. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, StateError>;

    /// Set (or refresh) a key's expiration, in seconds from now.
    async fn set_ttl(&self, key: &str, seconds: u64) -> Result<(), StateError>;

    /// Remaining seconds until expiration, or `None` if the key has no TTL
    /// or does not exist.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, StateError>;

    /// Fetch a value. `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Overwrite a value unconditionally, with an optional TTL in seconds.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), StateError>;

    /// Set a value only if the key is absent (or expired). Returns `true` if
    /// the value was written.
    async fn check_and_set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<bool, StateError>;

    /// Delete a key. Returns `true` if it existed (and was live).
    async fn del(&self, key: &str) -> Result<bool, StateError>;

    /// Enumerate all live `(key, value)` pairs whose key starts with
    /// `prefix`. Used sparingly — the admin CRL listing and Bloom rebuilds
    /// are the only callers.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StateError>;
}
