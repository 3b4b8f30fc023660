use crate::{BroadcastError, BroadcastResult};
use accord_types::{Definition, DefinitionType, SigningIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Off-message storage for payloads too large to travel inline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// BLAKE3 hex digest of the serialized payload.
    pub hash: String,
    pub size: usize,
}

/// One definition broadcast.
///
/// Built per call, owned by a single sender and never reused.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    /// Assigned on send.
    pub message_id: Option<Uuid>,
    pub definition_type: DefinitionType,
    pub namespace: String,
    pub topic: String,
    pub signer: SigningIdentity,
    /// Canonical definition payload. `Null` once staged as a blob.
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<BlobRef>,
    pub created: DateTime<Utc>,
}

impl BroadcastEnvelope {
    pub fn for_definition<D: Definition>(
        definition: &D,
        signer: SigningIdentity,
    ) -> BroadcastResult<Self> {
        let payload = serde_json::to_value(definition)
            .map_err(|e| BroadcastError::Serialization(e.to_string()))?;
        Ok(Self {
            message_id: None,
            definition_type: D::TYPE,
            namespace: definition.header().namespace.clone(),
            topic: D::TYPE.topic().to_string(),
            signer,
            payload,
            blob: None,
            created: Utc::now(),
        })
    }
}
