//! Accord Runtime - wires definition coordinators into a running node.
//!
//! Reads [`AccordConfig`] (defaults, file, `ACCORD_` environment), installs
//! the tracing subscriber and builds one interface and one API coordinator
//! per configured namespace.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod manager;
pub mod telemetry;

pub use config::{
    AccordConfig, BroadcastConfig, ContractsConfig, LoggingConfig, NamespaceConfig, RequestConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use manager::{LocalNode, Namespace, NamespaceManager};
pub use telemetry::init_tracing;
