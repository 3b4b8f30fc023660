//! Definition types.
//!
//! A definition is identified by `(namespace, name, version)`. Once published it
//! is also addressable by `(namespace, network_name, version)`, where the network
//! name may differ from the local one.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of definition the lifecycle understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionType {
    /// Contract interface: methods, events, errors.
    Interface,
    /// API facade published over an interface.
    Api,
}

impl DefinitionType {
    /// Broadcast topic that orders all definitions of this kind.
    pub fn topic(&self) -> &'static str {
        match self {
            DefinitionType::Interface => "accord_definitions_interface",
            DefinitionType::Api => "accord_definitions_api",
        }
    }
}

impl fmt::Display for DefinitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionType::Interface => write!(f, "interface"),
            DefinitionType::Api => write!(f, "api"),
        }
    }
}

/// `(namespace, name, version)` triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionKey {
    pub namespace: String,
    pub name: String,
    pub version: String,
}

impl DefinitionKey {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.namespace, self.name, self.version)
    }
}

/// Fields shared by every definition kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinitionHeader {
    pub id: Uuid,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    pub version: String,
    /// Declared author (DID or identity name). Defaults to the root organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    /// Canonical content hash, computed by the content resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl DefinitionHeader {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            namespace: String::new(),
            name: name.into(),
            network_name: None,
            version: version.into(),
            author: None,
            published: false,
            hash: None,
            created: None,
        }
    }

    /// The name other parties see. Falls back to the local name.
    pub fn effective_network_name(&self) -> &str {
        match self.network_name.as_deref() {
            Some(network_name) if !network_name.is_empty() => network_name,
            _ => &self.name,
        }
    }

    pub fn key(&self) -> DefinitionKey {
        DefinitionKey::new(&self.namespace, &self.name, &self.version)
    }
}

/// Behaviour common to every definition kind.
///
/// New kinds plug into the lifecycle by implementing this trait and supplying a
/// content resolver; the coordinator logic is shared.
pub trait Definition:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const TYPE: DefinitionType;

    fn header(&self) -> &DefinitionHeader;

    fn header_mut(&mut self) -> &mut DefinitionHeader;
}

/// A typed parameter of a method, event or error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Canonical type name used in signatures, e.g. `uint256`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub schema: serde_json::Value,
}

impl Param {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            schema: serde_json::Value::Null,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    /// Unique, URL-safe name; overloaded methods get a numeric suffix.
    #[serde(default)]
    pub pathname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub returns: Vec<Param>,
    #[serde(default)]
    pub signature: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub signature: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub signature: String,
}

/// Contract interface definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    #[serde(flatten)]
    pub header: DefinitionHeader,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub methods: Vec<InterfaceMethod>,
    #[serde(default)]
    pub events: Vec<InterfaceEvent>,
    #[serde(default)]
    pub errors: Vec<InterfaceError>,
}

impl InterfaceDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            header: DefinitionHeader::new(name, version),
            description: String::new(),
            methods: Vec::new(),
            events: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl Definition for InterfaceDefinition {
    const TYPE: DefinitionType = DefinitionType::Interface;

    fn header(&self) -> &DefinitionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut DefinitionHeader {
        &mut self.header
    }
}

/// Reference from an API facade to the interface it exposes.
///
/// Either the id, or the name and version, must be set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiUrls {
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub openapi: String,
    #[serde(default)]
    pub ui: String,
}

/// API facade over a contract interface, optionally bound to an on-chain location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiDefinition {
    #[serde(flatten)]
    pub header: DefinitionHeader,
    pub interface: InterfaceReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
    #[serde(default)]
    pub urls: ApiUrls,
}

impl ApiDefinition {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        interface: InterfaceReference,
    ) -> Self {
        Self {
            header: DefinitionHeader::new(name, version),
            interface,
            location: None,
            urls: ApiUrls::default(),
        }
    }
}

impl Definition for ApiDefinition {
    const TYPE: DefinitionType = DefinitionType::Api;

    fn header(&self) -> &DefinitionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut DefinitionHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_name_falls_back_to_local_name() {
        let mut header = DefinitionHeader::new("ffi1", "1.0");
        assert_eq!(header.effective_network_name(), "ffi1");

        header.network_name = Some(String::new());
        assert_eq!(header.effective_network_name(), "ffi1");

        header.network_name = Some("ffi1-shared".into());
        assert_eq!(header.effective_network_name(), "ffi1-shared");
    }

    #[test]
    fn header_flattens_into_definition_json() {
        let mut def = InterfaceDefinition::new("ffi1", "1.0");
        def.header.namespace = "ns1".into();
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["name"], "ffi1");
        assert_eq!(value["namespace"], "ns1");
        assert_eq!(value["published"], false);

        let back: InterfaceDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn key_display() {
        let key = DefinitionKey::new("ns1", "ffi1", "1.0");
        assert_eq!(key.to_string(), "ns1:ffi1@1.0");
    }
}
