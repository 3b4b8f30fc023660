//! Accord Definitions - the definition lifecycle coordinator.
//!
//! Two operations, generic over the definition kind:
//!
//! 1. **Define**: validate a new definition, then store it locally, or, when it
//!    is marked published and the namespace is multiparty, broadcast it.
//! 2. **Publish**: promote a local definition to the network under a network
//!    name, exactly once.
//!
//! ## Guarantees
//!
//! - Duplicate checks and the writes they guard share one store transaction,
//!   so concurrent attempts on the same key produce one winner and a conflict.
//! - The root organization and signer are resolved on every broadcast.
//! - Nothing is retried internally. Collaborator errors reach the caller
//!   unchanged; see [`DefinitionError::kind`].
//! - Waiting for confirmation happens after the local commit. Cancelling the
//!   wait never retracts an accepted submission.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod coordinator;
pub mod error;
pub mod mocks;

pub use coordinator::{CoordinatorConfig, DefinitionCoordinator};
pub use error::{DefinitionError, DefinitionResult, ErrorKind};
pub use mocks::{MockBroadcaster, MockContentResolver, MockIdentityResolver, MockOutcome};
