//! vpcform IBM Cloud VPC Provider
//!
//! IBM Cloud VPC API Provider implementation.
//!
//! ## Module Structure
//!
//! - `config` - Credentials, region and endpoint settings
//! - `client` - HTTP client, IAM token exchange and pagination
//! - `models` - Wire models of the VPC API and their flatteners
//! - `resources` - Resource type definitions and configurations
//! - `schemas` - Attribute schemas per resource kind
//! - `provider` - IbmVpcProvider implementation
//! - `operations` - Per-kind create, update and delete requests

pub mod client;
pub mod config;
pub mod models;
mod operations;
pub mod provider;
pub mod resources;
pub mod schemas;

#[cfg(test)]
mod testing;

// Re-export main types
pub use client::{ApiClient, ApiError, HttpClient};
pub use config::{ConfigError, ProviderConfig};
pub use provider::IbmVpcProvider;

use std::collections::HashMap;

use vpcform_core::provider::{BoxFuture, Provider, ProviderResult};
use vpcform_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for IbmVpcProvider {
    fn name(&self) -> &'static str {
        "ibm"
    }

    fn resource_types(&self) -> Vec<Box<dyn vpcform_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn list(
        &self,
        resource_type: &str,
        filters: &HashMap<String, String>,
    ) -> BoxFuture<'_, ProviderResult<Vec<State>>> {
        let resource_type = resource_type.to_string();
        let filters = filters.clone();
        Box::pin(async move { self.list_resources(&resource_type, &filters).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
