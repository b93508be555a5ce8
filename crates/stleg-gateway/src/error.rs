use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayPipelineError {
    #[error("state store error: {0}")]
    Store(String),
}
