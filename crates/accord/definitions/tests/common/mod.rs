#![allow(dead_code)]

use accord_definitions::{
    CoordinatorConfig, DefinitionCoordinator, MockBroadcaster, MockContentResolver,
    MockIdentityResolver,
};
use accord_storage::{
    DefinitionReader, DefinitionRecord, DefinitionStore, InMemoryDefinitionStore, QueryWindow,
};
use accord_types::{DefinitionType, InterfaceDefinition, OperatingMode};
use std::sync::Arc;

pub const NS: &str = "ns1";

pub struct Harness {
    pub store: Arc<InMemoryDefinitionStore>,
    pub resolver: Arc<MockContentResolver>,
    pub identity: Arc<MockIdentityResolver>,
    pub broadcast: MockBroadcaster,
    pub coordinator: Arc<DefinitionCoordinator<InterfaceDefinition>>,
}

pub fn harness(mode: OperatingMode) -> Harness {
    harness_with(CoordinatorConfig::new(NS, mode), MockIdentityResolver::new())
}

pub fn harness_with(config: CoordinatorConfig, identity: MockIdentityResolver) -> Harness {
    let store = Arc::new(InMemoryDefinitionStore::default());
    let resolver = Arc::new(MockContentResolver::new());
    let identity = Arc::new(identity);
    let broadcast = MockBroadcaster::new();
    let coordinator = Arc::new(DefinitionCoordinator::<InterfaceDefinition>::new(
        config,
        resolver.clone(),
        store.clone(),
        identity.clone(),
        Arc::new(broadcast.clone()),
    ));
    Harness {
        store,
        resolver,
        identity,
        broadcast,
        coordinator,
    }
}

pub fn ffi(name: &str, version: &str, published: bool) -> InterfaceDefinition {
    let mut def = InterfaceDefinition::new(name, version);
    def.header.published = published;
    def
}

/// Commit a record directly, bypassing the coordinator.
pub async fn seed(store: &InMemoryDefinitionStore, mut def: InterfaceDefinition) -> InterfaceDefinition {
    def.header.namespace = NS.to_string();
    let mut txn = store.begin().await.unwrap();
    txn.insert_or_get(DefinitionRecord::from_definition(&def).unwrap())
        .await
        .unwrap();
    txn.commit().await.unwrap();
    def
}

pub async fn stored(
    store: &InMemoryDefinitionStore,
    name: &str,
    version: &str,
) -> Option<InterfaceDefinition> {
    store
        .get_by_local_name(DefinitionType::Interface, NS, name, version)
        .await
        .unwrap()
        .map(|record| record.to_definition().unwrap())
}

pub async fn record_count(store: &InMemoryDefinitionStore) -> usize {
    store
        .list_definitions(DefinitionType::Interface, NS, QueryWindow::default())
        .await
        .unwrap()
        .len()
}

pub async fn event_count(store: &InMemoryDefinitionStore) -> usize {
    store
        .list_events(NS, QueryWindow::default())
        .await
        .unwrap()
        .len()
}
