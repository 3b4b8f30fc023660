//! Accord storage abstractions.
//!
//! This crate defines the storage contract the definition lifecycle relies on:
//! - definition records, addressable by local name and by network name
//! - definition events (audit trail of accepted definitions)
//! - scoped transactions giving check-then-act sequences serializable isolation
//!
//! Design stance:
//! - A transaction is an owned value. Dropping it without `commit` rolls back.
//! - Readers outside a transaction only ever observe committed state.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod model;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryDefinitionStore;
pub use model::DefinitionRecord;
pub use traits::{DefinitionReader, DefinitionStore, DefinitionTransaction, QueryWindow};
