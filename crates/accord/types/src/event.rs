use crate::definition::{DefinitionHeader, DefinitionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    InterfaceConfirmed,
    ApiConfirmed,
}

impl From<DefinitionType> for EventType {
    fn from(value: DefinitionType) -> Self {
        match value {
            DefinitionType::Interface => EventType::InterfaceConfirmed,
            DefinitionType::Api => EventType::ApiConfirmed,
        }
    }
}

/// Audit event recorded when a definition is accepted into local storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinitionEvent {
    pub id: Uuid,
    /// Assigned by the store on insert; zero until then.
    #[serde(default)]
    pub sequence: u64,
    pub namespace: String,
    pub event_type: EventType,
    /// Id of the definition the event refers to.
    pub reference: Uuid,
    pub topic: String,
    pub created: DateTime<Utc>,
}

impl DefinitionEvent {
    pub fn confirmed(definition_type: DefinitionType, header: &DefinitionHeader) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            namespace: header.namespace.clone(),
            event_type: definition_type.into(),
            reference: header.id,
            topic: definition_type.topic().to_string(),
            created: Utc::now(),
        }
    }
}
