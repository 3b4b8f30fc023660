//! Scriptable collaborators for exercising the coordinator.
//!
//! Each mock counts its calls and can be told to fail with a fixed message.

use accord_broadcast::{
    BroadcastEnvelope, BroadcastError, BroadcastFactory, BroadcastResult, BroadcastSender,
    Confirmation, DeliveryState,
};
use accord_contracts::{ContentError, ContentResolver, ContentResult};
use accord_identity::{IdentityError, IdentityResolver, IdentityResult};
use accord_types::{
    Definition, DefinitionHeader, Identity, IdentityStatus, IdentityType, RequestContext,
    SignerRef, SigningIdentity,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use uuid::Uuid;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock content resolver. Accepts everything unless told to fail.
#[derive(Default)]
pub struct MockContentResolver {
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    seen: Mutex<Vec<DefinitionHeader>>,
}

impl MockContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *guard(&self.failure) = Some(message.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Headers as they were when handed to `resolve`.
    pub fn seen(&self) -> Vec<DefinitionHeader> {
        guard(&self.seen).clone()
    }
}

#[async_trait]
impl<D: Definition> ContentResolver<D> for MockContentResolver {
    async fn resolve(&self, _ctx: &RequestContext, definition: &mut D) -> ContentResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        guard(&self.seen).push(definition.header().clone());
        if let Some(message) = guard(&self.failure).clone() {
            return Err(ContentError::MissingField(message));
        }
        let header = definition.header_mut();
        header.hash = Some(format!("hash:{}", header.effective_network_name()));
        Ok(())
    }
}

/// Mock identity resolver with a single root organization.
pub struct MockIdentityResolver {
    root: Mutex<Option<Identity>>,
    signing_failure: Mutex<Option<String>>,
    root_calls: AtomicUsize,
    signer_calls: AtomicUsize,
    hints: Mutex<Vec<SignerRef>>,
}

impl MockIdentityResolver {
    /// Root organization `org1` present.
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Some(Self::org("org1"))),
            signing_failure: Mutex::new(None),
            root_calls: AtomicUsize::new(0),
            signer_calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    /// No root organization registered yet.
    pub fn without_root() -> Self {
        let resolver = Self::new();
        *guard(&resolver.root) = None;
        resolver
    }

    pub fn org(name: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            did: Identity::did_for(IdentityType::Org, name),
            identity_type: IdentityType::Org,
            name: name.to_string(),
            parent: None,
            verifiers: Vec::new(),
            status: IdentityStatus::Active,
        }
    }

    pub fn set_root(&self, root: Option<Identity>) {
        *guard(&self.root) = root;
    }

    pub fn fail_signing_with(&self, message: impl Into<String>) {
        *guard(&self.signing_failure) = Some(message.into());
    }

    pub fn root_calls(&self) -> usize {
        self.root_calls.load(Ordering::SeqCst)
    }

    pub fn signer_calls(&self) -> usize {
        self.signer_calls.load(Ordering::SeqCst)
    }

    pub fn hints(&self) -> Vec<SignerRef> {
        guard(&self.hints).clone()
    }
}

impl Default for MockIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for MockIdentityResolver {
    async fn root_organization(&self, _ctx: &RequestContext) -> IdentityResult<Identity> {
        self.root_calls.fetch_add(1, Ordering::SeqCst);
        guard(&self.root).clone().ok_or(IdentityError::RootOrgMissing)
    }

    async fn resolve_signing_identity(
        &self,
        _ctx: &RequestContext,
        signer: &SignerRef,
    ) -> IdentityResult<SigningIdentity> {
        self.signer_calls.fetch_add(1, Ordering::SeqCst);
        guard(&self.hints).push(signer.clone());
        if let Some(message) = guard(&self.signing_failure).clone() {
            return Err(IdentityError::NotFound(message));
        }
        let author = signer.author.clone().ok_or(IdentityError::MissingAuthor)?;
        Ok(SigningIdentity {
            key: format!("{}#key", author),
            author,
        })
    }
}

/// How the mock network settles a sent message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MockOutcome {
    #[default]
    Confirmed,
    Rejected(String),
    /// Never settles on its own; see [`MockBroadcaster::settle_all`].
    Pending,
}

#[derive(Default)]
struct MockBroadcastState {
    built: AtomicUsize,
    prepared: AtomicUsize,
    sent: AtomicUsize,
    prepare_failure: Mutex<Option<String>>,
    send_failure: Mutex<Option<String>>,
    outcome: Mutex<MockOutcome>,
    envelopes: Mutex<Vec<BroadcastEnvelope>>,
    pending: Mutex<Vec<watch::Sender<DeliveryState>>>,
}

/// Mock broadcast factory. Cloning shares counters.
#[derive(Clone, Default)]
pub struct MockBroadcaster {
    state: Arc<MockBroadcastState>,
}

impl MockBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_prepare_with(&self, message: impl Into<String>) {
        *guard(&self.state.prepare_failure) = Some(message.into());
    }

    pub fn fail_send_with(&self, message: impl Into<String>) {
        *guard(&self.state.send_failure) = Some(message.into());
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *guard(&self.state.outcome) = outcome;
    }

    /// Senders constructed.
    pub fn built(&self) -> usize {
        self.state.built.load(Ordering::SeqCst)
    }

    pub fn prepared(&self) -> usize {
        self.state.prepared.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> usize {
        self.state.sent.load(Ordering::SeqCst)
    }

    /// Envelopes that were actually sent.
    pub fn envelopes(&self) -> Vec<BroadcastEnvelope> {
        guard(&self.state.envelopes).clone()
    }

    /// Settle every pending message.
    pub fn settle_all(&self, outcome: DeliveryState) {
        for tx in guard(&self.state.pending).drain(..) {
            tx.send_replace(outcome.clone());
        }
    }
}

impl BroadcastFactory for MockBroadcaster {
    fn new_broadcast(&self, envelope: BroadcastEnvelope) -> Box<dyn BroadcastSender> {
        self.state.built.fetch_add(1, Ordering::SeqCst);
        Box::new(MockSender {
            state: Arc::clone(&self.state),
            envelope: Some(envelope),
        })
    }
}

struct MockSender {
    state: Arc<MockBroadcastState>,
    envelope: Option<BroadcastEnvelope>,
}

#[async_trait]
impl BroadcastSender for MockSender {
    async fn prepare(&mut self, _ctx: &RequestContext) -> BroadcastResult<()> {
        self.state.prepared.fetch_add(1, Ordering::SeqCst);
        match guard(&self.state.prepare_failure).clone() {
            Some(message) => Err(BroadcastError::Staging(message)),
            None => Ok(()),
        }
    }

    async fn send(&mut self, _ctx: &RequestContext) -> BroadcastResult<Confirmation> {
        if let Some(message) = guard(&self.state.send_failure).clone() {
            return Err(BroadcastError::Transport(message));
        }
        let mut envelope = self
            .envelope
            .take()
            .ok_or_else(|| BroadcastError::Transport("sender already used".to_string()))?;
        self.state.sent.fetch_add(1, Ordering::SeqCst);

        let message_id = Uuid::new_v4();
        envelope.message_id = Some(message_id);
        guard(&self.state.envelopes).push(envelope);

        let outcome = guard(&self.state.outcome).clone();
        Ok(match outcome {
            MockOutcome::Confirmed => Confirmation::settled(message_id, DeliveryState::Confirmed),
            MockOutcome::Rejected(reason) => {
                Confirmation::settled(message_id, DeliveryState::Rejected(reason))
            }
            MockOutcome::Pending => {
                let (tx, rx) = watch::channel(DeliveryState::Pending);
                guard(&self.state.pending).push(tx);
                Confirmation::new(message_id, rx)
            }
        })
    }
}
