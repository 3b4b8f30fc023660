//! Per-namespace coordinators over shared collaborators.

use crate::config::{AccordConfig, NamespaceConfig};
use crate::{RuntimeError, RuntimeResult};
use accord_broadcast::{BroadcastFactory, LoopbackBroadcaster, LoopbackConfig};
use accord_contracts::{ApiResolver, InterfaceResolver};
use accord_definitions::{CoordinatorConfig, DefinitionCoordinator};
use accord_identity::{IdentityRegistry, IdentityResolver};
use accord_storage::{DefinitionStore, InMemoryDefinitionStore};
use accord_types::{ApiDefinition, InterfaceDefinition, OperatingMode, RequestContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The coordinators serving one namespace.
pub struct Namespace {
    pub mode: OperatingMode,
    pub interfaces: Arc<DefinitionCoordinator<InterfaceDefinition>>,
    pub apis: Arc<DefinitionCoordinator<ApiDefinition>>,
}

/// Routes requests to the namespace that owns them.
///
/// Every namespace shares one store, one identity resolver and one broadcast
/// transport; only the operating mode and default signer differ.
pub struct NamespaceManager {
    namespaces: BTreeMap<String, Namespace>,
    confirm_timeout: Option<Duration>,
}

impl NamespaceManager {
    pub fn new<S>(
        config: &AccordConfig,
        store: Arc<S>,
        identity: Arc<dyn IdentityResolver>,
        broadcast: Arc<dyn BroadcastFactory>,
    ) -> RuntimeResult<Self>
    where
        S: DefinitionStore + 'static,
    {
        config.validate()?;

        let mut namespaces = BTreeMap::new();
        for ns in &config.namespaces {
            let coordinator_config = coordinator_config(ns);
            let interfaces = DefinitionCoordinator::<InterfaceDefinition>::new(
                coordinator_config.clone(),
                Arc::new(InterfaceResolver::new()),
                store.clone(),
                identity.clone(),
                broadcast.clone(),
            );
            let apis = DefinitionCoordinator::<ApiDefinition>::new(
                coordinator_config,
                Arc::new(ApiResolver::new(
                    store.clone(),
                    config.contracts.api_base_url.clone(),
                )),
                store.clone(),
                identity.clone(),
                broadcast.clone(),
            );

            info!(namespace = %ns.name, mode = %ns.mode, "Namespace initialized");
            namespaces.insert(
                ns.name.clone(),
                Namespace {
                    mode: ns.mode,
                    interfaces: Arc::new(interfaces),
                    apis: Arc::new(apis),
                },
            );
        }

        Ok(Self {
            namespaces,
            confirm_timeout: config.requests.confirm_timeout(),
        })
    }

    pub fn namespace(&self, name: &str) -> RuntimeResult<&Namespace> {
        self.namespaces
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownNamespace(name.to_string()))
    }

    pub fn interfaces(
        &self,
        namespace: &str,
    ) -> RuntimeResult<Arc<DefinitionCoordinator<InterfaceDefinition>>> {
        Ok(self.namespace(namespace)?.interfaces.clone())
    }

    pub fn apis(&self, namespace: &str) -> RuntimeResult<Arc<DefinitionCoordinator<ApiDefinition>>> {
        Ok(self.namespace(namespace)?.apis.clone())
    }

    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// A fresh context bounded by the configured confirmation timeout.
    pub fn request_context(&self) -> RequestContext {
        let ctx = RequestContext::background();
        match self.confirm_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

fn coordinator_config(ns: &NamespaceConfig) -> CoordinatorConfig {
    let mut config = CoordinatorConfig::new(ns.name.clone(), ns.mode);
    config.default_author = ns.default_author.clone();
    config
}

/// A self-contained node: in-memory store, local identity registry and a
/// loopback transport.
pub struct LocalNode {
    pub manager: NamespaceManager,
    pub store: Arc<InMemoryDefinitionStore>,
    pub identity: Arc<IdentityRegistry>,
    pub broadcaster: LoopbackBroadcaster,
}

impl LocalNode {
    pub fn new(config: &AccordConfig) -> RuntimeResult<Self> {
        let store = Arc::new(InMemoryDefinitionStore::default());
        let identity = Arc::new(IdentityRegistry::new());
        let broadcaster = LoopbackBroadcaster::new(LoopbackConfig::from(&config.broadcast));
        let manager = NamespaceManager::new(
            config,
            store.clone(),
            identity.clone(),
            Arc::new(broadcaster.clone()),
        )?;
        Ok(Self {
            manager,
            store,
            identity,
            broadcaster,
        })
    }
}
