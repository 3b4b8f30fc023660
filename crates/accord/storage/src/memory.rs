//! In-memory reference implementation of the definition store.
//!
//! Transactions are serialized through a single writer lock and operate on a
//! private copy of the committed state, which `commit` swaps in. This gives
//! serializable isolation and is deterministic and test-friendly. Production
//! deployments should use a transactional database backend.

use crate::model::DefinitionRecord;
use crate::traits::{DefinitionReader, DefinitionStore, DefinitionTransaction, QueryWindow};
use crate::{StorageError, StorageResult};
use accord_types::{DefinitionEvent, DefinitionType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type RecordKey = (DefinitionType, String, String, String);

fn record_key(
    definition_type: DefinitionType,
    namespace: &str,
    name: &str,
    version: &str,
) -> RecordKey {
    (
        definition_type,
        namespace.to_string(),
        name.to_string(),
        version.to_string(),
    )
}

#[derive(Clone, Default)]
struct StoreState {
    definitions: HashMap<RecordKey, DefinitionRecord>,
    // (type, namespace, network_name, version) -> local key
    by_network_name: HashMap<RecordKey, RecordKey>,
    events: Vec<DefinitionEvent>,
}

impl StoreState {
    fn get_by_local_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Option<DefinitionRecord> {
        self.definitions
            .get(&record_key(definition_type, namespace, name, version))
            .cloned()
    }

    fn get_by_network_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        network_name: &str,
        version: &str,
    ) -> Option<DefinitionRecord> {
        self.by_network_name
            .get(&record_key(definition_type, namespace, network_name, version))
            .and_then(|local| self.definitions.get(local))
            .cloned()
    }

    fn get_by_id(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        id: Uuid,
    ) -> Option<DefinitionRecord> {
        self.definitions
            .values()
            .find(|record| {
                record.definition_type == definition_type
                    && record.header.namespace == namespace
                    && record.header.id == id
            })
            .cloned()
    }

    fn claim_network_name(
        &mut self,
        network_key: RecordKey,
        local_key: &RecordKey,
    ) -> StorageResult<()> {
        if let Some(owner) = self.by_network_name.get(&network_key) {
            if owner != local_key {
                return Err(StorageError::Conflict(format!(
                    "network name {} version {} already claimed in namespace {}",
                    network_key.2, network_key.3, network_key.1
                )));
            }
        }
        self.by_network_name.insert(network_key, local_key.clone());
        Ok(())
    }

    fn insert_or_get(&mut self, record: DefinitionRecord) -> StorageResult<Option<DefinitionRecord>> {
        let header = &record.header;
        let local_key = record_key(
            record.definition_type,
            &header.namespace,
            &header.name,
            &header.version,
        );
        if let Some(existing) = self.definitions.get(&local_key) {
            return Ok(Some(existing.clone()));
        }

        if let Some(network_name) = header.network_name.as_deref().filter(|n| !n.is_empty()) {
            let network_key = record_key(
                record.definition_type,
                &header.namespace,
                network_name,
                &header.version,
            );
            self.claim_network_name(network_key, &local_key)?;
        }

        self.definitions.insert(local_key, record);
        Ok(None)
    }

    fn mark_published(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
        network_name: &str,
    ) -> StorageResult<DefinitionRecord> {
        let local_key = record_key(definition_type, namespace, name, version);
        if !self.definitions.contains_key(&local_key) {
            return Err(StorageError::NotFound(format!(
                "{} definition {}:{}@{}",
                definition_type, namespace, name, version
            )));
        }

        let network_key = record_key(definition_type, namespace, network_name, version);
        self.claim_network_name(network_key, &local_key)?;

        let record = self.definitions.get_mut(&local_key).ok_or_else(|| {
            StorageError::NotFound(format!(
                "{} definition {}:{}@{}",
                definition_type, namespace, name, version
            ))
        })?;
        if let Some(previous) = record.header.network_name.clone() {
            if previous != network_name {
                self.by_network_name
                    .remove(&record_key(definition_type, namespace, &previous, version));
            }
        }
        record.set_published(network_name)?;
        Ok(record.clone())
    }

    fn insert_event(&mut self, mut event: DefinitionEvent) -> DefinitionEvent {
        event.sequence = self.events.len() as u64 + 1;
        self.events.push(event.clone());
        event
    }
}

/// In-memory definition store.
#[derive(Default)]
pub struct InMemoryDefinitionStore {
    committed: Arc<RwLock<StoreState>>,
    writer: Arc<Mutex<()>>,
}

impl InMemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> StorageResult<T> {
        let guard = self
            .committed
            .read()
            .map_err(|_| StorageError::Backend("definition store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }
}

#[async_trait]
impl DefinitionReader for InMemoryDefinitionStore {
    async fn get_by_local_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>> {
        self.read(|state| state.get_by_local_name(definition_type, namespace, name, version))
    }

    async fn get_by_network_name(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        network_name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>> {
        self.read(|state| {
            state.get_by_network_name(definition_type, namespace, network_name, version)
        })
    }

    async fn get_by_id(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        id: Uuid,
    ) -> StorageResult<Option<DefinitionRecord>> {
        self.read(|state| state.get_by_id(definition_type, namespace, id))
    }

    async fn list_definitions(
        &self,
        definition_type: DefinitionType,
        namespace: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<DefinitionRecord>> {
        let mut values = self.read(|state| {
            state
                .definitions
                .values()
                .filter(|record| {
                    record.definition_type == definition_type
                        && record.header.namespace == namespace
                })
                .cloned()
                .collect::<Vec<_>>()
        })?;
        values.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(apply_window(values, window))
    }

    async fn list_events(
        &self,
        namespace: &str,
        window: QueryWindow,
    ) -> StorageResult<Vec<DefinitionEvent>> {
        let values = self.read(|state| {
            state
                .events
                .iter()
                .filter(|event| event.namespace == namespace)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        Ok(apply_window(values, window))
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn begin(&self) -> StorageResult<Box<dyn DefinitionTransaction>> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        let working = self.read(|state| state.clone())?;
        Ok(Box::new(InMemoryTransaction {
            _guard: guard,
            committed: Arc::clone(&self.committed),
            working,
        }))
    }
}

/// Transaction over a private copy of the committed state.
struct InMemoryTransaction {
    _guard: OwnedMutexGuard<()>,
    committed: Arc<RwLock<StoreState>>,
    working: StoreState,
}

#[async_trait]
impl DefinitionTransaction for InMemoryTransaction {
    async fn get_by_local_name(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>> {
        Ok(self
            .working
            .get_by_local_name(definition_type, namespace, name, version))
    }

    async fn get_by_network_name(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        network_name: &str,
        version: &str,
    ) -> StorageResult<Option<DefinitionRecord>> {
        Ok(self
            .working
            .get_by_network_name(definition_type, namespace, network_name, version))
    }

    async fn insert_or_get(
        &mut self,
        record: DefinitionRecord,
    ) -> StorageResult<Option<DefinitionRecord>> {
        self.working.insert_or_get(record)
    }

    async fn mark_published(
        &mut self,
        definition_type: DefinitionType,
        namespace: &str,
        name: &str,
        version: &str,
        network_name: &str,
    ) -> StorageResult<DefinitionRecord> {
        self.working
            .mark_published(definition_type, namespace, name, version, network_name)
    }

    async fn insert_event(&mut self, event: DefinitionEvent) -> StorageResult<DefinitionEvent> {
        Ok(self.working.insert_event(event))
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let InMemoryTransaction {
            _guard,
            committed,
            working,
        } = *self;
        let mut guard = committed
            .write()
            .map_err(|_| StorageError::Backend("definition store lock poisoned".to_string()))?;
        *guard = working;
        Ok(())
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_types::InterfaceDefinition;
    use std::time::Duration;

    fn interface(name: &str, version: &str) -> DefinitionRecord {
        let mut def = InterfaceDefinition::new(name, version);
        def.header.namespace = "ns1".to_string();
        DefinitionRecord::from_definition(&def).unwrap()
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_and_rolled_back() {
        let store = InMemoryDefinitionStore::new();
        {
            let mut txn = store.begin().await.unwrap();
            txn.insert_or_get(interface("ffi1", "1.0")).await.unwrap();
            let own = txn
                .get_by_local_name(DefinitionType::Interface, "ns1", "ffi1", "1.0")
                .await
                .unwrap();
            assert!(own.is_some());

            let outside = store
                .get_by_local_name(DefinitionType::Interface, "ns1", "ffi1", "1.0")
                .await
                .unwrap();
            assert!(outside.is_none());
        }

        let after_drop = store
            .get_by_local_name(DefinitionType::Interface, "ns1", "ffi1", "1.0")
            .await
            .unwrap();
        assert!(after_drop.is_none());
    }

    #[tokio::test]
    async fn insert_or_get_returns_existing() {
        let store = InMemoryDefinitionStore::new();
        let first = interface("ffi1", "1.0");
        let first_id = first.header.id;

        let mut txn = store.begin().await.unwrap();
        assert!(txn.insert_or_get(first).await.unwrap().is_none());
        txn.commit().await.unwrap();

        let mut txn = store.begin().await.unwrap();
        let existing = txn
            .insert_or_get(interface("ffi1", "1.0"))
            .await
            .unwrap()
            .expect("existing record");
        assert_eq!(existing.header.id, first_id);
        txn.commit().await.unwrap();

        let all = store
            .list_definitions(DefinitionType::Interface, "ns1", QueryWindow::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn mark_published_indexes_network_name() {
        let store = InMemoryDefinitionStore::new();
        let mut txn = store.begin().await.unwrap();
        txn.insert_or_get(interface("ffi1", "1.0")).await.unwrap();
        txn.insert_or_get(interface("ffi2", "1.0")).await.unwrap();
        let published = txn
            .mark_published(DefinitionType::Interface, "ns1", "ffi1", "1.0", "shared")
            .await
            .unwrap();
        assert!(published.header.published);

        let clash = txn
            .mark_published(DefinitionType::Interface, "ns1", "ffi2", "1.0", "shared")
            .await;
        assert!(matches!(clash, Err(StorageError::Conflict(_))));
        txn.commit().await.unwrap();

        let found = store
            .get_by_network_name(DefinitionType::Interface, "ns1", "shared", "1.0")
            .await
            .unwrap()
            .expect("published record");
        assert_eq!(found.header.name, "ffi1");
        assert!(store
            .get_by_network_name(DefinitionType::Interface, "ns1", "ffi2", "1.0")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn mark_published_on_missing_record_is_not_found() {
        let store = InMemoryDefinitionStore::new();
        let mut txn = store.begin().await.unwrap();
        let result = txn
            .mark_published(DefinitionType::Api, "ns1", "missing", "1.0", "missing")
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn events_are_sequenced_per_commit() {
        let store = InMemoryDefinitionStore::new();
        let record = interface("ffi1", "1.0");
        let mut txn = store.begin().await.unwrap();
        let first = txn
            .insert_event(DefinitionEvent::confirmed(
                DefinitionType::Interface,
                &record.header,
            ))
            .await
            .unwrap();
        let second = txn
            .insert_event(DefinitionEvent::confirmed(
                DefinitionType::Interface,
                &record.header,
            ))
            .await
            .unwrap();
        txn.commit().await.unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        let events = store
            .list_events("ns1", QueryWindow { limit: 1, offset: 1 })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 2);
    }

    #[tokio::test]
    async fn transactions_are_serialized() {
        let store = Arc::new(InMemoryDefinitionStore::new());
        let first = store.begin().await.unwrap();

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut txn = store.begin().await.unwrap();
                txn.get_by_local_name(DefinitionType::Interface, "ns1", "ffi1", "1.0")
                    .await
                    .unwrap()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        let mut first = first;
        first.insert_or_get(interface("ffi1", "1.0")).await.unwrap();
        first.commit().await.unwrap();

        let seen = contender.await.unwrap();
        assert!(seen.is_some());
    }
}
