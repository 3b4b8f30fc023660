use accord_storage::StorageError;
use thiserror::Error;

/// Content validation errors.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidName {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("duplicate {kind} signature: {signature}")]
    DuplicateSignature { kind: String, signature: String },

    #[error("invalid parameter '{param}' of {owner}: {reason}")]
    InvalidParam {
        owner: String,
        param: String,
        reason: String,
    },

    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("failed to canonicalize definition: {0}")]
    Serialization(String),

    #[error("storage error while resolving: {0}")]
    Storage(#[from] StorageError),
}

pub type ContentResult<T> = Result<T, ContentError>;
