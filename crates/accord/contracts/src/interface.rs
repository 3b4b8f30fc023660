//! Interface content resolution.
//!
//! Normalizes a contract interface: checks names, assigns ids, computes the
//! canonical `name(type,...)` signatures, derives unique path names for
//! overloaded methods and stamps a content hash.

use crate::names::validate_name;
use crate::{validate_header, ContentError, ContentResolver, ContentResult};
use accord_types::{InterfaceDefinition, Param, RequestContext};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Content resolver for [`InterfaceDefinition`].
#[derive(Debug, Clone, Default)]
pub struct InterfaceResolver;

impl InterfaceResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentResolver<InterfaceDefinition> for InterfaceResolver {
    async fn resolve(
        &self,
        _ctx: &RequestContext,
        definition: &mut InterfaceDefinition,
    ) -> ContentResult<()> {
        validate_header(&definition.header)?;

        let mut seen = HashSet::new();
        let mut overloads: HashMap<String, usize> = HashMap::new();
        for method in definition.methods.iter_mut() {
            validate_name("method name", &method.name)?;
            check_params(&format!("method {}", method.name), &method.params)?;
            check_params(&format!("method {}", method.name), &method.returns)?;

            method.signature = signature(&method.name, &method.params);
            if !seen.insert(method.signature.clone()) {
                return Err(ContentError::DuplicateSignature {
                    kind: "method".to_string(),
                    signature: method.signature.clone(),
                });
            }

            let count = overloads.entry(method.name.clone()).or_insert(0);
            method.pathname = match *count {
                0 => method.name.clone(),
                n => format!("{}_{}", method.name, n),
            };
            *count += 1;
            method.id = method.id.or_else(|| Some(Uuid::new_v4()));
        }

        let mut seen = HashSet::new();
        for event in definition.events.iter_mut() {
            validate_name("event name", &event.name)?;
            check_params(&format!("event {}", event.name), &event.params)?;
            event.signature = signature(&event.name, &event.params);
            if !seen.insert(event.signature.clone()) {
                return Err(ContentError::DuplicateSignature {
                    kind: "event".to_string(),
                    signature: event.signature.clone(),
                });
            }
            event.id = event.id.or_else(|| Some(Uuid::new_v4()));
        }

        let mut seen = HashSet::new();
        for error in definition.errors.iter_mut() {
            validate_name("error name", &error.name)?;
            check_params(&format!("error {}", error.name), &error.params)?;
            error.signature = signature(&error.name, &error.params);
            if !seen.insert(error.signature.clone()) {
                return Err(ContentError::DuplicateSignature {
                    kind: "error".to_string(),
                    signature: error.signature.clone(),
                });
            }
            error.id = error.id.or_else(|| Some(Uuid::new_v4()));
        }

        let hash = content_hash(definition)?;
        debug!(
            namespace = %definition.header.namespace,
            name = %definition.header.name,
            version = %definition.header.version,
            hash = %hash,
            "Resolved interface"
        );
        definition.header.hash = Some(hash);
        definition.header.created = definition.header.created.or_else(|| Some(Utc::now()));
        Ok(())
    }
}

/// `name(type1,type2)`
pub fn signature(name: &str, params: &[Param]) -> String {
    let types: Vec<&str> = params.iter().map(|p| p.type_name.as_str()).collect();
    format!("{}({})", name, types.join(","))
}

fn check_params(owner: &str, params: &[Param]) -> ContentResult<()> {
    for (index, param) in params.iter().enumerate() {
        if param.type_name.trim().is_empty() {
            return Err(ContentError::InvalidParam {
                owner: owner.to_string(),
                param: if param.name.is_empty() {
                    format!("#{}", index)
                } else {
                    param.name.clone()
                },
                reason: "type is required".to_string(),
            });
        }
        if param.type_name.chars().any(|c| c.is_whitespace() || c == ',') {
            return Err(ContentError::InvalidParam {
                owner: owner.to_string(),
                param: param.name.clone(),
                reason: format!("type '{}' is not canonical", param.type_name),
            });
        }
    }
    Ok(())
}

/// Hash over the network-visible identity and every signature. Ids, timestamps
/// and the local name do not contribute.
fn content_hash(definition: &InterfaceDefinition) -> ContentResult<String> {
    let returns: Vec<String> = definition
        .methods
        .iter()
        .map(|m| signature("", &m.returns))
        .collect();
    let canonical = json!({
        "name": definition.header.effective_network_name(),
        "version": definition.header.version,
        "methods": definition.methods.iter().map(|m| &m.signature).collect::<Vec<_>>(),
        "returns": returns,
        "events": definition.events.iter().map(|e| &e.signature).collect::<Vec<_>>(),
        "errors": definition.errors.iter().map(|e| &e.signature).collect::<Vec<_>>(),
    });
    let bytes =
        serde_json::to_vec(&canonical).map_err(|e| ContentError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_types::{InterfaceEvent, InterfaceMethod};
    use proptest::prelude::*;

    fn method(name: &str, types: &[&str]) -> InterfaceMethod {
        InterfaceMethod {
            name: name.to_string(),
            params: types
                .iter()
                .enumerate()
                .map(|(i, t)| Param::new(format!("p{}", i), *t))
                .collect(),
            ..Default::default()
        }
    }

    fn interface() -> InterfaceDefinition {
        let mut def = InterfaceDefinition::new("ffi1", "1.0");
        def.header.namespace = "ns1".into();
        def
    }

    #[tokio::test]
    async fn overloads_get_unique_pathnames() {
        let mut def = interface();
        def.methods = vec![
            method("set", &["uint256"]),
            method("set", &["uint256", "string"]),
            method("get", &[]),
            method("set", &["bool"]),
        ];
        def.events.push(InterfaceEvent {
            name: "Changed".into(),
            params: vec![Param::new("value", "uint256")],
            ..Default::default()
        });

        InterfaceResolver::new()
            .resolve(&RequestContext::background(), &mut def)
            .await
            .unwrap();

        let paths: Vec<&str> = def.methods.iter().map(|m| m.pathname.as_str()).collect();
        assert_eq!(paths, vec!["set", "set_1", "get", "set_2"]);
        assert_eq!(def.methods[1].signature, "set(uint256,string)");
        assert_eq!(def.methods[2].signature, "get()");
        assert_eq!(def.events[0].signature, "Changed(uint256)");
        assert!(def.methods.iter().all(|m| m.id.is_some()));
        assert!(def.header.hash.is_some());
        assert!(def.header.created.is_some());
    }

    #[tokio::test]
    async fn duplicate_signature_rejected() {
        let mut def = interface();
        def.methods = vec![method("set", &["uint256"]), method("set", &["uint256"])];
        let err = InterfaceResolver::new()
            .resolve(&RequestContext::background(), &mut def)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::DuplicateSignature { .. }));
    }

    #[tokio::test]
    async fn missing_param_type_rejected() {
        let mut def = interface();
        def.methods = vec![method("set", &[""])];
        let err = InterfaceResolver::new()
            .resolve(&RequestContext::background(), &mut def)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidParam { .. }));
    }

    #[tokio::test]
    async fn hash_follows_network_name() {
        let resolver = InterfaceResolver::new();
        let ctx = RequestContext::background();
        let mut local = interface();
        local.methods = vec![method("set", &["uint256"])];
        let mut shared = local.clone();
        shared.header.network_name = Some("ffi1-shared".into());

        resolver.resolve(&ctx, &mut local).await.unwrap();
        let first = local.header.hash.clone();
        resolver.resolve(&ctx, &mut local).await.unwrap();
        assert_eq!(local.header.hash, first);

        resolver.resolve(&ctx, &mut shared).await.unwrap();
        assert_ne!(shared.header.hash, first);
    }

    proptest! {
        #[test]
        fn property_signature_is_name_and_types(
            name in "[a-z][a-zA-Z0-9]{0,10}",
            types in proptest::collection::vec("(uint256|string|bool|address|bytes32)", 0..6),
        ) {
            let params: Vec<Param> = types.iter().map(|t| Param::new("p", t.clone())).collect();
            let sig = signature(&name, &params);
            let expected_prefix = format!("{}(", name);
            prop_assert!(sig.starts_with(&expected_prefix));
            prop_assert!(sig.ends_with(')'));
            prop_assert_eq!(sig, format!("{}({})", name, types.join(",")));
        }
    }
}
