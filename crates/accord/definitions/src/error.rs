use accord_broadcast::BroadcastError;
use accord_contracts::ContentError;
use accord_identity::IdentityError;
use accord_storage::StorageError;
use accord_types::{DefinitionKey, DefinitionType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification callers match on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationFailed,
    NotAllowed,
    Conflict,
    PreconditionMissing,
    IdentityResolutionFailed,
    TransportFailed,
    Query,
}

/// Errors from the definition lifecycle.
///
/// Only `NotAllowed`, `AlreadyDefined` and `AlreadyPublished` originate here.
/// Everything else is the collaborator's own error, passed through unchanged.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("{0}")]
    NotAllowed(&'static str),

    #[error("{definition_type} {key} already defined")]
    AlreadyDefined {
        definition_type: DefinitionType,
        key: DefinitionKey,
    },

    #[error("{definition_type} {key} already published")]
    AlreadyPublished {
        definition_type: DefinitionType,
        key: DefinitionKey,
    },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DefinitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DefinitionError::NotAllowed(_) => ErrorKind::NotAllowed,
            DefinitionError::AlreadyDefined { .. } | DefinitionError::AlreadyPublished { .. } => {
                ErrorKind::Conflict
            }
            DefinitionError::Content(ContentError::Storage(_)) => ErrorKind::Query,
            DefinitionError::Content(_) => ErrorKind::ValidationFailed,
            DefinitionError::Identity(e) if e.is_precondition() => ErrorKind::PreconditionMissing,
            DefinitionError::Identity(_) => ErrorKind::IdentityResolutionFailed,
            DefinitionError::Broadcast(_) => ErrorKind::TransportFailed,
            DefinitionError::Storage(StorageError::Conflict(_)) => ErrorKind::Conflict,
            DefinitionError::Storage(_) => ErrorKind::Query,
        }
    }
}

pub type DefinitionResult<T> = Result<T, DefinitionError>;

pub(crate) const NETWORK_OPERATION_REQUIRED: &str =
    "published definitions require a multiparty network; this namespace runs in gateway mode";

pub(crate) const PUBLISH_NOT_SUPPORTED: &str =
    "publishing is not supported in gateway mode";

#[cfg(test)]
mod tests {
    use super::*;
    use accord_types::Interrupt;

    #[test]
    fn collaborator_errors_keep_their_text() {
        let err: DefinitionError = IdentityError::RootOrgMissing.into();
        assert_eq!(err.to_string(), IdentityError::RootOrgMissing.to_string());
        assert_eq!(err.kind(), ErrorKind::PreconditionMissing);

        let err: DefinitionError = BroadcastError::Interrupted(Interrupt::Cancelled).into();
        assert_eq!(err.to_string(), "request cancelled by caller");
        assert_eq!(err.kind(), ErrorKind::TransportFailed);
    }

    #[test]
    fn kinds_are_classified() {
        let key = DefinitionKey::new("ns1", "ffi1", "1.0");
        let conflict = DefinitionError::AlreadyDefined {
            definition_type: DefinitionType::Interface,
            key: key.clone(),
        };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(conflict.to_string(), "interface ns1:ffi1@1.0 already defined");

        let not_found: DefinitionError = StorageError::NotFound("ffi1".into()).into();
        assert_eq!(not_found.kind(), ErrorKind::Query);

        let invalid: DefinitionError = ContentError::MissingField("name".into()).into();
        assert_eq!(invalid.kind(), ErrorKind::ValidationFailed);

        let identity: DefinitionError = IdentityError::NotFound("org9".into()).into();
        assert_eq!(identity.kind(), ErrorKind::IdentityResolutionFailed);
    }
}
