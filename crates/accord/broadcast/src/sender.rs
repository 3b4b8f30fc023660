use crate::{BroadcastEnvelope, BroadcastError, BroadcastResult};
use accord_types::RequestContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Network outcome of a submitted message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Rejected(String),
}

impl DeliveryState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, DeliveryState::Pending)
    }
}

/// Handle returned by a successful [`BroadcastSender::send`].
///
/// The submission is already durable; waiting on the handle only observes the
/// outcome, and abandoning the wait does not retract the message.
#[derive(Debug)]
pub struct Confirmation {
    message_id: Uuid,
    state: watch::Receiver<DeliveryState>,
}

impl Confirmation {
    pub fn new(message_id: Uuid, state: watch::Receiver<DeliveryState>) -> Self {
        Self { message_id, state }
    }

    /// A confirmation whose outcome is already known.
    pub fn settled(message_id: Uuid, outcome: DeliveryState) -> Self {
        let (_tx, rx) = watch::channel(outcome);
        Self::new(message_id, rx)
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    /// Current state without blocking.
    pub fn state(&self) -> DeliveryState {
        (*self.state.borrow()).clone()
    }

    /// Block until the network confirms or rejects the message, or the caller
    /// gives up.
    pub async fn wait(mut self, ctx: &RequestContext) -> BroadcastResult<()> {
        let message_id = self.message_id;
        loop {
            let current = (*self.state.borrow_and_update()).clone();
            match current {
                DeliveryState::Confirmed => return Ok(()),
                DeliveryState::Rejected(reason) => {
                    return Err(BroadcastError::Rejected { message_id, reason })
                }
                DeliveryState::Pending => {}
            }

            tokio::select! {
                changed = self.state.changed() => {
                    changed.map_err(|_| BroadcastError::Abandoned(message_id))?;
                }
                interrupt = ctx.done() => return Err(interrupt.into()),
            }
        }
    }
}

/// A disposable sender bound to one envelope.
#[async_trait]
pub trait BroadcastSender: Send {
    /// Stage out-of-band resources without transmitting anything.
    async fn prepare(&mut self, ctx: &RequestContext) -> BroadcastResult<()>;

    /// Submit the message. Returns once it is accepted for transmission; the
    /// network outcome arrives through the returned [`Confirmation`].
    async fn send(&mut self, ctx: &RequestContext) -> BroadcastResult<Confirmation>;
}

/// Builds a fresh sender per broadcast.
pub trait BroadcastFactory: Send + Sync {
    fn new_broadcast(&self, envelope: BroadcastEnvelope) -> Box<dyn BroadcastSender>;
}
