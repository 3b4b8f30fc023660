//! Accord Contracts - content resolution per definition kind.
//!
//! A [`ContentResolver`] validates and normalizes a candidate definition before
//! the lifecycle touches storage or the network. Resolution is repeatable: a
//! definition resolved again under a different network name gets a fresh
//! canonical hash.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod api;
mod error;
mod interface;
pub mod names;

pub use api::ApiResolver;
pub use error::{ContentError, ContentResult};
pub use interface::{signature, InterfaceResolver};

use accord_types::{Definition, DefinitionHeader, RequestContext};
use async_trait::async_trait;

/// Validates and normalizes one kind of definition.
#[async_trait]
pub trait ContentResolver<D: Definition>: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, definition: &mut D) -> ContentResult<()>;
}

/// Checks shared by every kind: namespace, name, version and any network name.
pub fn validate_header(header: &DefinitionHeader) -> ContentResult<()> {
    names::validate_name("namespace", &header.namespace)?;
    names::validate_name("name", &header.name)?;
    names::validate_name("version", &header.version)?;
    if let Some(network_name) = header.network_name.as_deref().filter(|n| !n.is_empty()) {
        names::validate_name("network name", network_name)?;
    }
    Ok(())
}
