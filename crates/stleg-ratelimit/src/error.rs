use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("counter store error: {0}")]
    Store(String),
}
