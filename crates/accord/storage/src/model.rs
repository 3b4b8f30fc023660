use crate::{StorageError, StorageResult};
use accord_types::{Definition, DefinitionHeader, DefinitionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persistent definition record.
///
/// The store is kind-agnostic: `header` carries the indexed fields and `body`
/// the full serialized definition. Typed access goes through
/// [`DefinitionRecord::from_definition`] and [`DefinitionRecord::to_definition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRecord {
    pub definition_type: DefinitionType,
    pub header: DefinitionHeader,
    pub body: Value,
    pub updated_at: DateTime<Utc>,
}

impl DefinitionRecord {
    pub fn from_definition<D: Definition>(definition: &D) -> StorageResult<Self> {
        let body = serde_json::to_value(definition)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            definition_type: D::TYPE,
            header: definition.header().clone(),
            body,
            updated_at: Utc::now(),
        })
    }

    pub fn to_definition<D: Definition>(&self) -> StorageResult<D> {
        if self.definition_type != D::TYPE {
            return Err(StorageError::CorruptRecord(format!(
                "record {} is a {} definition, not {}",
                self.header.id,
                self.definition_type,
                D::TYPE
            )));
        }
        serde_json::from_value(self.body.clone())
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Flip the record to published under `network_name`, keeping header and body in step.
    pub fn set_published(&mut self, network_name: &str) -> StorageResult<()> {
        let body = self.body.as_object_mut().ok_or_else(|| {
            StorageError::CorruptRecord(format!(
                "record {} body is not an object",
                self.header.id
            ))
        })?;
        body.insert("published".to_string(), Value::Bool(true));
        body.insert(
            "network_name".to_string(),
            Value::String(network_name.to_string()),
        );
        self.header.published = true;
        self.header.network_name = Some(network_name.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }
}
