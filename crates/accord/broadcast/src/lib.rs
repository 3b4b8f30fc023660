//! Accord Broadcast - disposable senders for definition broadcasts.
//!
//! A sender is built per call from a [`BroadcastEnvelope`]:
//! - `prepare` stages out-of-band resources (large payload blobs) without
//!   transmitting
//! - `send` submits and hands back a [`Confirmation`] to wait on
//!
//! [`LoopbackBroadcaster`] is an in-process transport for single-node
//! deployments and tests.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod envelope;
mod error;
pub mod loopback;
mod sender;

pub use envelope::{BlobRef, BroadcastEnvelope};
pub use error::{BroadcastError, BroadcastResult};
pub use loopback::{LoopbackBroadcaster, LoopbackConfig, SentMessage};
pub use sender::{BroadcastFactory, BroadcastSender, Confirmation, DeliveryState};
