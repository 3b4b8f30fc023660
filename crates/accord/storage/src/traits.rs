use crate::model::DefinitionRecord;
use crate::StorageResult;
use accord_types::{DefinitionEvent, DefinitionType};
use async_trait::async_trait;
use uuid::Uuid;

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Reads against committed state.
#[async_trait]
pub trait DefinitionReader: Send + Sync {
    /// Lookup by local `(namespace, name, version)`.
    async fn get_by_local_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>>;

    /// Lookup by `(namespace, network_name, version)`. Only records that carry a
    /// network name (published or broadcast) are addressable this way.
    async fn get_by_network_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        network_name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>>;

    async fn get_by_id(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        id: Uuid,
    ) -> StorageResult<Option<DefinitionRecord>>;

    /// List definitions of one kind in a namespace, oldest first.
    async fn list_definitions(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<DefinitionRecord>>;

    /// Read events in sequence order.
    async fn list_events(
        &self,
        namespace: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<DefinitionEvent>>;
}

/// One atomic unit of work.
///
/// Reads observe the transaction's own writes. Nothing is visible to other
/// readers until [`DefinitionTransaction::commit`]; dropping the transaction
/// discards every write.
#[async_trait]
pub trait DefinitionTransaction: Send {
    async fn get_by_local_name(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>>;

    async fn get_by_network_name(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        network_name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>>;

    /// Insert a record. If a record with the same local key already exists it is
    /// returned untouched and nothing is written.
    async fn insert_or_get(
        &mut self,
        record: DefinitionRecord,
    ) -> StorageResult<Option<DefinitionRecord>>;

    /// Mark an existing record published under `network_name`.
    async fn mark_published(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
        network_name: &str,
    ) -> StorageResult<DefinitionRecord>;

    /// Append an event and return it with its assigned sequence number.
    async fn insert_event(&mut self, event: DefinitionEvent) -> StorageResult<DefinitionEvent>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;
}

/// Storage bundle used by the definition lifecycle.
#[async_trait]
pub trait DefinitionStore: DefinitionReader {
    /// Open a transaction. Transactions are serializable with respect to each other.
    async fn begin(&self) -> StorageResult<Box<dyn DefinitionTransaction>>;
}
