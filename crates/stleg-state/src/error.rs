use thiserror::Error;

/// Errors surfaced by a `StateStore` implementation.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("stored value is not a valid counter: {0}")]
    NotACounter(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
