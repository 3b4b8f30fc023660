//! Accord Identity - root organization and signing identity resolution
//!
//! Every broadcast is attributed to exactly one signing identity, resolved
//! fresh for each send. The network's root organization must be registered
//! before anything can be broadcast.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

use accord_types::{
    Identity, IdentityStatus, IdentityType, RequestContext, SignerRef, SigningIdentity, Verifier,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Resolves the identities a broadcast is attributed to.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The network's anchor organization.
    async fn root_organization(&self, ctx: &RequestContext) -> IdentityResult<Identity>;

    /// Resolve and validate a caller-supplied signer hint.
    async fn resolve_signing_identity(
        &self,
        ctx: &RequestContext,
        signer: &SignerRef,
    ) -> IdentityResult<SigningIdentity>;
}

/// Identity registry for organizations and nodes.
pub struct IdentityRegistry {
    identities: RwLock<HashMap<Uuid, Identity>>,
    root_org: RwLock<Option<Uuid>>,
}

impl IdentityRegistry {
    /// Create an empty registry with no root organization.
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            root_org: RwLock::new(None),
        }
    }

    /// Register a new identity
    pub fn register(&self, request: RegistrationRequest) -> IdentityResult<Identity> {
        if request.name.is_empty() {
            return Err(IdentityError::InvalidFormat(
                "identity name must not be empty".to_string(),
            ));
        }
        let did = Identity::did_for(request.identity_type, &request.name);

        let mut identities = self
            .identities
            .write()
            .map_err(|_| IdentityError::LockError)?;
        if identities.values().any(|existing| existing.did == did) {
            return Err(IdentityError::AlreadyRegistered(did));
        }
        if let Some(parent) = request.parent {
            if !identities.contains_key(&parent) {
                return Err(IdentityError::NotFound(parent.to_string()));
            }
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            did,
            identity_type: request.identity_type,
            name: request.name,
            parent: request.parent,
            verifiers: request.verifiers,
            status: IdentityStatus::Active,
        };
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    /// Designate a registered organization as the network root.
    pub fn set_root_org(&self, id: Uuid) -> IdentityResult<()> {
        let identities = self
            .identities
            .read()
            .map_err(|_| IdentityError::LockError)?;
        let identity = identities
            .get(&id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        if identity.identity_type != IdentityType::Org {
            return Err(IdentityError::InvalidFormat(format!(
                "{} is not an organization",
                identity.did
            )));
        }

        let mut root = self.root_org.write().map_err(|_| IdentityError::LockError)?;
        *root = Some(id);
        Ok(())
    }

    /// Lookup an identity by DID or by name
    pub fn lookup(&self, reference: &str) -> IdentityResult<Option<Identity>> {
        let identities = self
            .identities
            .read()
            .map_err(|_| IdentityError::LockError)?;
        if let Some(identity) = identities.values().find(|i| i.did == reference) {
            return Ok(Some(identity.clone()));
        }
        let mut by_name = identities.values().filter(|i| i.name == reference);
        match (by_name.next(), by_name.next()) {
            (Some(identity), None) => Ok(Some(identity.clone())),
            (Some(_), Some(_)) => Err(IdentityError::Ambiguous(reference.to_string())),
            _ => Ok(None),
        }
    }

    /// Suspend an identity
    pub fn suspend(&self, id: Uuid, reason: &str) -> IdentityResult<()> {
        self.set_status(id, IdentityStatus::Suspended(reason.to_string()))
    }

    /// Revoke an identity
    pub fn revoke(&self, id: Uuid, reason: &str) -> IdentityResult<()> {
        self.set_status(id, IdentityStatus::Revoked(reason.to_string()))
    }

    fn set_status(&self, id: Uuid, status: IdentityStatus) -> IdentityResult<()> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| IdentityError::LockError)?;
        let identity = identities
            .get_mut(&id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        identity.status = status;
        Ok(())
    }

    fn current_root(&self) -> IdentityResult<Identity> {
        let root = *self.root_org.read().map_err(|_| IdentityError::LockError)?;
        let root = root.ok_or(IdentityError::RootOrgMissing)?;
        let identities = self
            .identities
            .read()
            .map_err(|_| IdentityError::LockError)?;
        identities
            .get(&root)
            .cloned()
            .ok_or(IdentityError::RootOrgMissing)
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for IdentityRegistry {
    async fn root_organization(&self, _ctx: &RequestContext) -> IdentityResult<Identity> {
        let root = self.current_root()?;
        if !root.is_active() {
            return Err(IdentityError::Inactive {
                did: root.did,
                status: format!("{:?}", root.status),
            });
        }
        Ok(root)
    }

    async fn resolve_signing_identity(
        &self,
        _ctx: &RequestContext,
        signer: &SignerRef,
    ) -> IdentityResult<SigningIdentity> {
        let author = signer
            .author
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(IdentityError::MissingAuthor)?;
        let identity = self
            .lookup(author)?
            .ok_or_else(|| IdentityError::NotFound(author.to_string()))?;

        if !identity.is_active() {
            return Err(IdentityError::Inactive {
                did: identity.did,
                status: format!("{:?}", identity.status),
            });
        }

        let key = match signer.key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                if !identity.verifiers.iter().any(|v| v.value == key) {
                    return Err(IdentityError::KeyNotFound {
                        did: identity.did,
                        key: key.to_string(),
                    });
                }
                key.to_string()
            }
            None => identity
                .verifiers
                .first()
                .map(|v| v.value.clone())
                .ok_or_else(|| IdentityError::NoSigningKey(identity.did.clone()))?,
        };

        Ok(SigningIdentity {
            author: identity.did,
            key,
        })
    }
}

/// Request to register a new identity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub identity_type: IdentityType,
    pub name: String,
    pub parent: Option<Uuid>,
    pub verifiers: Vec<Verifier>,
}

impl RegistrationRequest {
    pub fn org(name: impl Into<String>, verifiers: Vec<Verifier>) -> Self {
        Self {
            identity_type: IdentityType::Org,
            name: name.into(),
            parent: None,
            verifiers,
        }
    }
}

/// Identity-related errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("root organization has not been registered for this network")]
    RootOrgMissing,

    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("identity reference is ambiguous: {0}")]
    Ambiguous(String),

    #[error("identity {did} is not active: {status}")]
    Inactive { did: String, status: String },

    #[error("identity {did} has no key {key}")]
    KeyNotFound { did: String, key: String },

    #[error("identity {0} has no signing key")]
    NoSigningKey(String),

    #[error("no author supplied for signing")]
    MissingAuthor,

    #[error("identity already registered: {0}")]
    AlreadyRegistered(String),

    #[error("invalid identity format: {0}")]
    InvalidFormat(String),

    #[error("Lock error")]
    LockError,
}

impl IdentityError {
    /// The network has not been initialised; operator action is required.
    pub fn is_precondition(&self) -> bool {
        matches!(self, IdentityError::RootOrgMissing)
    }
}
