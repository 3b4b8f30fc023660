use accord_definitions::DefinitionError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("failed to initialise tracing: {0}")]
    Telemetry(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
