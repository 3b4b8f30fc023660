//! In-process transport.
//!
//! Messages land in an outbox instead of on a ledger. The confirmation
//! pipeline is driven by hand through [`LoopbackBroadcaster::confirm`] and
//! [`LoopbackBroadcaster::reject`], or settled immediately with auto-confirm.

use crate::{
    BlobRef, BroadcastEnvelope, BroadcastError, BroadcastFactory, BroadcastResult,
    BroadcastSender, Confirmation, DeliveryState,
};
use accord_types::RequestContext;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Loopback transport limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Payloads above this size are staged as blobs by `prepare`.
    pub inline_limit: usize,
    /// Payloads above this size are refused outright.
    pub max_payload: usize,
    /// Settle every message as confirmed the moment it is sent.
    pub auto_confirm: bool,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            inline_limit: 64 * 1024,
            max_payload: 16 * 1024 * 1024,
            auto_confirm: false,
        }
    }
}

/// A message that reached the outbox.
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub sequence: u64,
    pub envelope: BroadcastEnvelope,
    pub state: DeliveryState,
}

struct OutboxEntry {
    sequence: u64,
    envelope: BroadcastEnvelope,
    state: watch::Sender<DeliveryState>,
}

#[derive(Default)]
struct Outbox {
    messages: DashMap<Uuid, OutboxEntry>,
    blobs: DashMap<String, Vec<u8>>,
    next_sequence: AtomicU64,
}

/// Loopback broadcaster. Cloning shares the outbox.
#[derive(Clone, Default)]
pub struct LoopbackBroadcaster {
    config: LoopbackConfig,
    outbox: Arc<Outbox>,
}

impl LoopbackBroadcaster {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            outbox: Arc::new(Outbox::default()),
        }
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Settle a pending message as confirmed.
    pub fn confirm(&self, message_id: Uuid) -> BroadcastResult<()> {
        self.settle(message_id, DeliveryState::Confirmed)
    }

    /// Settle a pending message as rejected.
    pub fn reject(&self, message_id: Uuid, reason: impl Into<String>) -> BroadcastResult<()> {
        self.settle(message_id, DeliveryState::Rejected(reason.into()))
    }

    fn settle(&self, message_id: Uuid, outcome: DeliveryState) -> BroadcastResult<()> {
        let entry = self
            .outbox
            .messages
            .get(&message_id)
            .ok_or(BroadcastError::UnknownMessage(message_id))?;
        if entry.state.borrow().is_settled() {
            return Err(BroadcastError::AlreadySettled(message_id));
        }
        match &outcome {
            DeliveryState::Rejected(reason) => {
                warn!(message_id = %message_id, reason = %reason, "Broadcast rejected")
            }
            _ => info!(message_id = %message_id, "Broadcast confirmed"),
        }
        entry.state.send_replace(outcome);
        Ok(())
    }

    /// Every message sent so far, in submission order.
    pub fn sent(&self) -> Vec<SentMessage> {
        let mut sent: Vec<SentMessage> = self
            .outbox
            .messages
            .iter()
            .map(|entry| SentMessage {
                sequence: entry.sequence,
                envelope: entry.envelope.clone(),
                state: (*entry.state.borrow()).clone(),
            })
            .collect();
        sent.sort_by_key(|message| message.sequence);
        sent
    }

    /// Ids of messages still awaiting an outcome, in submission order.
    pub fn pending(&self) -> Vec<Uuid> {
        self.sent()
            .into_iter()
            .filter(|message| !message.state.is_settled())
            .filter_map(|message| message.envelope.message_id)
            .collect()
    }

    pub fn blob(&self, hash: &str) -> Option<Vec<u8>> {
        self.outbox.blobs.get(hash).map(|blob| blob.value().clone())
    }
}

impl BroadcastFactory for LoopbackBroadcaster {
    fn new_broadcast(&self, envelope: BroadcastEnvelope) -> Box<dyn BroadcastSender> {
        Box::new(LoopbackSender {
            config: self.config.clone(),
            outbox: Arc::clone(&self.outbox),
            envelope,
            prepared: false,
            sent: None,
        })
    }
}

struct LoopbackSender {
    config: LoopbackConfig,
    outbox: Arc<Outbox>,
    envelope: BroadcastEnvelope,
    prepared: bool,
    sent: Option<Uuid>,
}

impl LoopbackSender {
    fn check(&self, ctx: &RequestContext) -> BroadcastResult<()> {
        if let Some(message_id) = self.sent {
            return Err(BroadcastError::AlreadySent(message_id));
        }
        if let Some(interrupt) = ctx.interrupted() {
            return Err(interrupt.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BroadcastSender for LoopbackSender {
    async fn prepare(&mut self, ctx: &RequestContext) -> BroadcastResult<()> {
        self.check(ctx)?;
        if self.prepared {
            return Ok(());
        }

        let bytes = serde_json::to_vec(&self.envelope.payload)
            .map_err(|e| BroadcastError::Serialization(e.to_string()))?;
        if bytes.len() > self.config.max_payload {
            return Err(BroadcastError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.config.max_payload,
            });
        }

        if bytes.len() > self.config.inline_limit {
            let hash = blake3::hash(&bytes).to_hex().to_string();
            debug!(
                namespace = %self.envelope.namespace,
                hash = %hash,
                size = bytes.len(),
                "Staging broadcast payload as blob"
            );
            let size = bytes.len();
            self.outbox.blobs.insert(hash.clone(), bytes);
            self.envelope.blob = Some(BlobRef { hash, size });
            self.envelope.payload = serde_json::Value::Null;
        }

        self.prepared = true;
        Ok(())
    }

    async fn send(&mut self, ctx: &RequestContext) -> BroadcastResult<Confirmation> {
        self.check(ctx)?;
        if !self.prepared {
            self.prepare(ctx).await?;
        }

        let message_id = Uuid::new_v4();
        let initial = if self.config.auto_confirm {
            DeliveryState::Confirmed
        } else {
            DeliveryState::Pending
        };
        let (tx, rx) = watch::channel(initial);

        let mut envelope = self.envelope.clone();
        envelope.message_id = Some(message_id);
        let sequence = self.outbox.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            message_id = %message_id,
            namespace = %envelope.namespace,
            topic = %envelope.topic,
            signer = %envelope.signer,
            sequence,
            "Broadcast accepted"
        );
        self.outbox.messages.insert(
            message_id,
            OutboxEntry {
                sequence,
                envelope,
                state: tx,
            },
        );

        self.sent = Some(message_id);
        Ok(Confirmation::new(message_id, rx))
    }
}
