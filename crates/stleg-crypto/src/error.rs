use thiserror::Error;

/// Errors internal to key directory management. Verification failures
/// proper are reported as `stleg_core::RejectionReason`, not this type —
/// this enum covers the collaborator-facing operations (loading and
/// refreshing the directory) that sit outside the per-request hot path.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key directory source error: {0}")]
    Source(String),

    #[error("key directory source returned no well-formed entries")]
    EmptyDirectory,

    #[error("invalid public key material for kid {0}")]
    InvalidKey(String),
}
