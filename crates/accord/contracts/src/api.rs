//! API facade content resolution.

use crate::{validate_header, ContentError, ContentResolver, ContentResult};
use accord_storage::DefinitionReader;
use accord_types::{
    ApiDefinition, ApiUrls, DefinitionType, InterfaceReference, RequestContext,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Content resolver for [`ApiDefinition`].
///
/// The referenced interface must already exist in the API's namespace.
pub struct ApiResolver {
    reader: Arc<dyn DefinitionReader>,
    base_url: String,
}

impl ApiResolver {
    pub fn new(reader: Arc<dyn DefinitionReader>, base_url: impl Into<String>) -> Self {
        Self {
            reader,
            base_url: base_url.into(),
        }
    }

    async fn resolve_interface(
        &self,
        namespace: &str,
        reference: &InterfaceReference,
    ) -> ContentResult<InterfaceReference> {
        let record = match (reference.id, &reference.name, &reference.version) {
            (Some(id), _, _) => self
                .reader
                .get_by_id(DefinitionType::Interface, namespace, id)
                .await?
                .ok_or_else(|| ContentError::InterfaceNotFound(id.to_string()))?,
            (None, Some(name), Some(version)) => self
                .reader
                .get_by_local_name(DefinitionType::Interface, namespace, name, version)
                .await?
                .ok_or_else(|| ContentError::InterfaceNotFound(format!("{}@{}", name, version)))?,
            _ => {
                return Err(ContentError::MissingField(
                    "interface (id, or name and version)".to_string(),
                ))
            }
        };

        Ok(InterfaceReference {
            id: Some(record.header.id),
            name: Some(record.header.name),
            version: Some(record.header.version),
        })
    }

    fn urls(&self, namespace: &str, name: &str) -> ApiUrls {
        let api = format!(
            "{}/api/v1/namespaces/{}/apis/{}",
            self.base_url.trim_end_matches('/'),
            namespace,
            name
        );
        ApiUrls {
            openapi: format!("{}/api/swagger.json", api),
            ui: format!("{}/api", api),
            api,
        }
    }
}

#[async_trait]
impl ContentResolver<ApiDefinition> for ApiResolver {
    async fn resolve(
        &self,
        _ctx: &RequestContext,
        definition: &mut ApiDefinition,
    ) -> ContentResult<()> {
        validate_header(&definition.header)?;
        if let Some(location) = &definition.location {
            if !location.is_object() {
                return Err(ContentError::InvalidParam {
                    owner: format!("api {}", definition.header.name),
                    param: "location".to_string(),
                    reason: "must be an object".to_string(),
                });
            }
        }

        definition.interface = self
            .resolve_interface(&definition.header.namespace, &definition.interface)
            .await?;
        definition.urls = self.urls(&definition.header.namespace, &definition.header.name);

        let canonical = json!({
            "name": definition.header.effective_network_name(),
            "version": definition.header.version,
            "interface": definition.interface.id,
            "location": definition.location,
        });
        let bytes = serde_json::to_vec(&canonical)
            .map_err(|e| ContentError::Serialization(e.to_string()))?;
        let hash = blake3::hash(&bytes).to_hex().to_string();

        debug!(
            namespace = %definition.header.namespace,
            name = %definition.header.name,
            version = %definition.header.version,
            hash = %hash,
            "Resolved API"
        );
        definition.header.hash = Some(hash);
        definition.header.created = definition.header.created.or_else(|| Some(Utc::now()));
        Ok(())
    }
}
