use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a definition store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("definition not found: {0}")]
    NotFound(String),

    /// A uniqueness index (local key or network name) is already held.
    #[error("definition conflict: {0}")]
    Conflict(String),

    /// A stored record cannot be read back as the requested definition kind.
    #[error("corrupt definition record: {0}")]
    CorruptRecord(String),

    #[error("definition encoding error: {0}")]
    Serialization(String),

    #[error("store backend error: {0}")]
    Backend(String),
}
