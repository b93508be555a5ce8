use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("authoritative revocation store error: {0}")]
    Store(String),
}
