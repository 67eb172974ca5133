//! Per-kind create, update and delete operations
//!
//! Each submodule extends [`IbmVpcProvider`](crate::provider::IbmVpcProvider)
//! with the requests of one resource family.

mod compute;
mod network;
mod security;

use serde_json::{Map, Value as Json, json};
use vpcform_core::flatten::value_to_json;
use vpcform_core::provider::{ProviderError, ProviderResult};
use vpcform_core::resource::{Resource, Value};

use crate::provider::IbmVpcProvider;
use crate::resources::ResourceConfig;

/// Request body assembled from caller attributes
#[derive(Debug, Default)]
pub(crate) struct Body(Map<String, Json>);

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Copy attribute `attr` as is
    pub fn attr(self, key: &str, resource: &Resource, attr: &str) -> Self {
        match resource.attributes.get(attr) {
            Some(value) => self.field(key, value_to_json(value)),
            None => self,
        }
    }

    /// Copy attribute `attr` as an `{"id": ...}` reference
    pub fn reference(self, key: &str, resource: &Resource, attr: &str) -> Self {
        match resource.get_str(attr) {
            Some(id) => self.field(key, json!({ "id": id })),
            None => self,
        }
    }

    /// Copy attribute `attr` as a `{"name": ...}` reference
    pub fn named(self, key: &str, resource: &Resource, attr: &str) -> Self {
        match resource.get_str(attr) {
            Some(name) => self.field(key, json!({ "name": name })),
            None => self,
        }
    }

    pub fn resource_group(self, resource: &Resource) -> Self {
        self.reference("resource_group", resource, "resource_group")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn build(self) -> Json {
        Json::Object(self.0)
    }
}

pub(crate) fn required_str<'a>(resource: &'a Resource, attr: &str) -> ProviderResult<&'a str> {
    resource
        .get_str(attr)
        .ok_or_else(|| ProviderError::invalid_input(format!("'{}' is required", attr)))
}

/// String elements of a list attribute
pub(crate) fn string_list<'a>(resource: &'a Resource, attr: &str) -> Vec<&'a str> {
    resource
        .attributes
        .get(attr)
        .and_then(Value::as_list)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

impl IbmVpcProvider {
    /// PATCH the name of a kind whose only updatable attribute is its name
    pub(crate) async fn update_name(
        &self,
        config: &ResourceConfig,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<()> {
        let body = Body::new().attr("name", to, "name");
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&config.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }
}
