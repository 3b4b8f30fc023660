use accord_types::Interrupt;
use thiserror::Error;
use uuid::Uuid;

/// Broadcast-layer errors.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("failed to serialize broadcast payload: {0}")]
    Serialization(String),

    #[error("failed to stage payload blob: {0}")]
    Staging(String),

    #[error("sender has already submitted message {0}")]
    AlreadySent(Uuid),

    #[error("message {message_id} rejected by the network: {reason}")]
    Rejected { message_id: Uuid, reason: String },

    #[error("confirmation for message {0} was abandoned by the transport")]
    Abandoned(Uuid),

    #[error("unknown message: {0}")]
    UnknownMessage(Uuid),

    #[error("message {0} has already been settled")]
    AlreadySettled(Uuid),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

impl BroadcastError {
    /// The caller stopped waiting; the submission itself may still be live.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, BroadcastError::Interrupted(_))
    }
}

pub type BroadcastResult<T> = Result<T, BroadcastError>;
