//! Identity types
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    Org,
    Node,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStatus {
    Active,
    Suspended(String),
    Revoked(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierKind {
    Ed25519PublicKey,
    EthAddress,
    X509Subject,
}

/// A key (or key-like reference) an identity signs with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verifier {
    pub kind: VerifierKind,
    pub value: String,
}

impl Verifier {
    pub fn new(kind: VerifierKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A registered network identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    /// `did:accord:<type>/<name>`
    pub did: String,
    pub identity_type: IdentityType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub verifiers: Vec<Verifier>,
    pub status: IdentityStatus,
}

impl Identity {
    pub fn did_for(identity_type: IdentityType, name: &str) -> String {
        let segment = match identity_type {
            IdentityType::Org => "org",
            IdentityType::Node => "node",
            IdentityType::Custom => "custom",
        };
        format!("did:accord:{}/{}", segment, name)
    }

    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)
    }
}

/// Caller-supplied hint naming who should sign a broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRef {
    /// DID or identity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Key to sign with; defaults to the author's first verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SignerRef {
    pub fn author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            key: None,
        }
    }
}

/// Fully resolved signer for one broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigningIdentity {
    pub author: String,
    pub key: String,
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.author, self.key)
    }
}
