//! Define and publish, generic over the definition kind.

use crate::error::{NETWORK_OPERATION_REQUIRED, PUBLISH_NOT_SUPPORTED};
use crate::{DefinitionError, DefinitionResult};
use accord_broadcast::{BroadcastEnvelope, BroadcastFactory, BroadcastSender, Confirmation};
use accord_contracts::ContentResolver;
use accord_identity::IdentityResolver;
use accord_storage::{DefinitionRecord, DefinitionStore, DefinitionTransaction, StorageError};
use accord_types::{
    Definition, DefinitionEvent, DefinitionHeader, DefinitionKey, Identity, OperatingMode,
    RequestContext, SignerRef,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Per-namespace coordinator settings. Fixed at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    pub namespace: String,
    pub mode: OperatingMode,
    /// Signer used when a definition declares no author. Falls back to the
    /// root organization.
    #[serde(default)]
    pub default_author: Option<String>,
}

impl CoordinatorConfig {
    pub fn new(namespace: impl Into<String>, mode: OperatingMode) -> Self {
        Self {
            namespace: namespace.into(),
            mode,
            default_author: None,
        }
    }
}

/// Coordinates the definition lifecycle for one kind in one namespace.
///
/// Holds no locks of its own: every check-then-act runs inside a single store
/// transaction, and the store's isolation decides who wins a race.
pub struct DefinitionCoordinator<D: Definition> {
    config: CoordinatorConfig,
    resolver: Arc<dyn ContentResolver<D>>,
    store: Arc<dyn DefinitionStore>,
    identity: Arc<dyn IdentityResolver>,
    broadcast: Arc<dyn BroadcastFactory>,
}

impl<D: Definition> DefinitionCoordinator<D> {
    pub fn new(
        config: CoordinatorConfig,
        resolver: Arc<dyn ContentResolver<D>>,
        store: Arc<dyn DefinitionStore>,
        identity: Arc<dyn IdentityResolver>,
        broadcast: Arc<dyn BroadcastFactory>,
    ) -> Self {
        Self {
            config,
            resolver,
            store,
            identity,
            broadcast,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn mode(&self) -> OperatingMode {
        self.config.mode
    }

    /// Register a new definition.
    ///
    /// Unpublished definitions are stored locally. A definition marked
    /// `published` is refused in gateway mode; in multiparty mode it is
    /// broadcast, attributed to the resolved signer, and recorded so later
    /// defines of the same key conflict. With `wait_for_confirm` the call also blocks until the network
    /// confirms or rejects the message; that wait happens after the local
    /// commit and never undoes it.
    pub async fn define(
        &self,
        ctx: &RequestContext,
        mut definition: D,
        wait_for_confirm: bool,
    ) -> DefinitionResult<D> {
        definition.header_mut().namespace = self.config.namespace.clone();
        let span = info_span!(
            "define",
            kind = %D::TYPE,
            namespace = %self.config.namespace,
            name = %definition.header().name,
            version = %definition.header().version,
            mode = %self.config.mode,
            request_id = %ctx.request_id(),
        );

        async move {
            let published = definition.header().published;
            if published && !self.config.mode.is_multiparty() {
                warn!("Rejected published definition in gateway mode");
                return Err(DefinitionError::NotAllowed(NETWORK_OPERATION_REQUIRED));
            }

            self.resolver.resolve(ctx, &mut definition).await?;

            if published {
                self.define_network(ctx, definition, wait_for_confirm).await
            } else {
                self.define_local(definition).await
            }
        }
        .instrument(span)
        .await
    }

    /// Unpublished definitions stay local in either mode until `publish`.
    async fn define_local(&self, mut definition: D) -> DefinitionResult<D> {
        definition.header_mut().network_name = None;

        let mut txn = self.store.begin().await?;
        let record = DefinitionRecord::from_definition(&definition)?;
        if let Some(existing) = txn.insert_or_get(record).await? {
            debug!(id = %existing.header.id, "Definition already stored locally");
            return Ok(existing.to_definition()?);
        }
        let event = txn
            .insert_event(DefinitionEvent::confirmed(D::TYPE, definition.header()))
            .await?;
        txn.commit().await?;

        info!(
            id = %definition.header().id,
            sequence = event.sequence,
            "Definition stored locally"
        );
        Ok(definition)
    }

    async fn define_network(
        &self,
        ctx: &RequestContext,
        mut definition: D,
        wait_for_confirm: bool,
    ) -> DefinitionResult<D> {
        let network_name = definition.header().effective_network_name().to_string();
        definition.header_mut().network_name = Some(network_name);

        let mut txn = self.store.begin().await?;
        self.ensure_unclaimed(txn.as_mut(), definition.header()).await?;

        let mut sender = self.sender_for(ctx, &definition).await?;
        let confirmation = sender.send(ctx).await?;

        txn.insert_or_get(DefinitionRecord::from_definition(&definition)?)
            .await?;
        txn.commit().await?;
        info!(
            id = %definition.header().id,
            message_id = %confirmation.message_id(),
            "Definition broadcast"
        );

        self.await_confirmation(ctx, confirmation, wait_for_confirm)
            .await?;
        Ok(definition)
    }

    /// Promote a locally defined definition to the network under
    /// `network_name`. Runs as one transaction; any failure before the commit
    /// leaves the stored definition unpublished.
    pub async fn publish(
        &self,
        ctx: &RequestContext,
        local_name: &str,
        version: &str,
        network_name: &str,
        wait_for_confirm: bool,
    ) -> DefinitionResult<D> {
        let span = info_span!(
            "publish",
            kind = %D::TYPE,
            namespace = %self.config.namespace,
            name = %local_name,
            version = %version,
            network_name = %network_name,
            request_id = %ctx.request_id(),
        );

        async move {
            if !self.config.mode.is_multiparty() {
                warn!("Rejected publish in gateway mode");
                return Err(DefinitionError::NotAllowed(PUBLISH_NOT_SUPPORTED));
            }
            let network_name = if network_name.is_empty() {
                local_name
            } else {
                network_name
            };
            let namespace = self.config.namespace.as_str();

            let mut txn = self.store.begin().await?;
            let record = txn
                .get_by_local_name(D::TYPE, namespace, local_name, version)
                .await?
                .ok_or_else(|| {
                    StorageError::NotFound(format!(
                        "{} definition {}",
                        D::TYPE,
                        DefinitionKey::new(namespace, local_name, version)
                    ))
                })?;
            let mut definition: D = record.to_definition()?;

            if definition.header().published {
                warn!("Definition already published");
                return Err(DefinitionError::AlreadyPublished {
                    definition_type: D::TYPE,
                    key: definition.header().key(),
                });
            }
            if let Some(existing) = txn
                .get_by_network_name(D::TYPE, namespace, network_name, version)
                .await?
            {
                if existing.header.id != definition.header().id {
                    warn!(existing = %existing.header.id, "Network name already claimed");
                    return Err(DefinitionError::AlreadyDefined {
                        definition_type: D::TYPE,
                        key: DefinitionKey::new(namespace, network_name, version),
                    });
                }
            }

            definition.header_mut().network_name = Some(network_name.to_string());
            self.resolver.resolve(ctx, &mut definition).await?;

            let mut sender = self.sender_for(ctx, &definition).await?;
            sender.prepare(ctx).await?;
            debug!("Broadcast prepared");
            let confirmation = sender.send(ctx).await?;

            txn.mark_published(D::TYPE, namespace, local_name, version, network_name)
                .await?;
            definition.header_mut().published = true;
            txn.commit().await?;
            info!(
                id = %definition.header().id,
                message_id = %confirmation.message_id(),
                "Definition published"
            );

            self.await_confirmation(ctx, confirmation, wait_for_confirm)
                .await?;
            Ok(definition)
        }
        .instrument(span)
        .await
    }

    /// Both the network name and the local key must be free.
    async fn ensure_unclaimed(
        &self,
        txn: &mut (dyn DefinitionTransaction + 'static),
        header: &DefinitionHeader,
    ) -> DefinitionResult<()> {
        let network_name = header.effective_network_name();
        let claimed = txn
            .get_by_network_name(D::TYPE, &header.namespace, network_name, &header.version)
            .await?
            .is_some()
            || txn
                .get_by_local_name(D::TYPE, &header.namespace, &header.name, &header.version)
                .await?
                .is_some();
        if claimed {
            warn!(network_name = %network_name, "Definition already exists");
            return Err(DefinitionError::AlreadyDefined {
                definition_type: D::TYPE,
                key: DefinitionKey::new(&header.namespace, network_name, &header.version),
            });
        }
        Ok(())
    }

    /// Resolve the root organization and signer afresh, then build a sender.
    async fn sender_for(
        &self,
        ctx: &RequestContext,
        definition: &D,
    ) -> DefinitionResult<Box<dyn BroadcastSender>> {
        let root = self.identity.root_organization(ctx).await?;
        let signer = self
            .identity
            .resolve_signing_identity(ctx, &self.signer_hint(definition.header(), &root))
            .await?;
        debug!(signer = %signer, root = %root, "Resolved signing identity");

        let envelope = BroadcastEnvelope::for_definition(definition, signer)?;
        Ok(self.broadcast.new_broadcast(envelope))
    }

    fn signer_hint(&self, header: &DefinitionHeader, root: &Identity) -> SignerRef {
        let author = header
            .author
            .as_deref()
            .filter(|a| !a.is_empty())
            .or(self.config.default_author.as_deref())
            .unwrap_or(root.did.as_str());
        SignerRef::author(author)
    }

    async fn await_confirmation(
        &self,
        ctx: &RequestContext,
        confirmation: Confirmation,
        wait_for_confirm: bool,
    ) -> DefinitionResult<()> {
        if !wait_for_confirm {
            return Ok(());
        }
        let message_id = confirmation.message_id();
        if let Err(e) = confirmation.wait(ctx).await {
            warn!(message_id = %message_id, error = %e, "Confirmation not received");
            return Err(e.into());
        }
        debug!(message_id = %message_id, "Broadcast confirmed");
        Ok(())
    }
}
