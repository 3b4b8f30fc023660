//! Accord Types - shared vocabulary for the definition lifecycle.
//!
//! - **Definitions**: namespaced, versioned network-object schemas
//!   ([`InterfaceDefinition`], [`ApiDefinition`]) behind the [`Definition`] trait
//! - **Identities**: organizations, signing identities and signer hints
//! - **Events**: audit records written when a definition lands in storage
//! - **Request context**: caller-owned cancellation and deadlines

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

pub mod context;
pub mod definition;
pub mod event;
pub mod identity;
pub mod mode;

pub use context::{CancelHandle, Interrupt, RequestContext};
pub use definition::{
    ApiDefinition, ApiUrls, Definition, DefinitionHeader, DefinitionKey, DefinitionType,
    InterfaceDefinition, InterfaceError, InterfaceEvent, InterfaceMethod, InterfaceReference,
    Param,
};
pub use event::{DefinitionEvent, EventType};
pub use identity::{
    Identity, IdentityStatus, IdentityType, SignerRef, SigningIdentity, Verifier, VerifierKind,
};
pub use mode::OperatingMode;
