//! IBM Cloud VPC Provider implementation
//!
//! Generic plumbing shared by every resource kind: fetching with 404
//! mapped to absence, status waits, deletes that tolerate an already
//! deleted object, and conversion of API objects into [`State`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::de::DeserializeOwned;
use vpcform_core::differ::{changed_attributes, comparable_attributes, replacement_attributes};
use vpcform_core::flatten::Flatten;
use vpcform_core::lock::NamedLocks;
use vpcform_core::provider::{ProviderError, ProviderResult};
use vpcform_core::resource::{Resource, ResourceId, State, Value};
use vpcform_core::schema::TypeError;
use vpcform_core::waiter::{Refresh, StatusWaiter};

use crate::client::{ApiClient, HttpClient, list_all};
use crate::config::{ConfigError, ProviderConfig};
use crate::models::*;
use crate::resources::{ResourceConfig, get_resource_config};

/// IBM Cloud VPC Provider
pub struct IbmVpcProvider {
    pub(crate) client: Arc<dyn ApiClient>,
    pub(crate) config: ProviderConfig,
    pub(crate) locks: NamedLocks,
}

pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value) -> ProviderResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::new("Failed to decode API response").with_cause(e))
}

/// Id of a freshly created object
pub(crate) fn created_id(body: &serde_json::Value) -> ProviderResult<String> {
    body.get("id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::new("Create response carries no id"))
}

/// Tag errors raised once `identifier` exists remotely, so callers can clean up
pub(crate) fn created_as(identifier: &str) -> impl FnOnce(ProviderError) -> ProviderError + '_ {
    move |e| e.with_identifier(identifier)
}

impl IbmVpcProvider {
    /// Create a provider talking to the real API
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = HttpClient::new(&config)?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create a provider over any [`ApiClient`]
    pub fn with_client(client: Arc<dyn ApiClient>, config: ProviderConfig) -> Self {
        Self {
            client,
            config,
            locks: NamedLocks::new(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn resource_config(
        &self,
        resource_type: &str,
    ) -> ProviderResult<&'static ResourceConfig> {
        get_resource_config(resource_type).ok_or_else(|| {
            ProviderError::invalid_input(format!("Unknown resource type: {}", resource_type))
        })
    }

    // =========================================================================
    // Generic API helpers
    // =========================================================================

    /// GET an object; `None` when the API answers 404
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<Option<T>> {
        match self.client.get(path, &[]).await {
            Ok(body) => decode(body).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh<T: DeserializeOwned + Lifecycle>(
        &self,
        path: &str,
    ) -> ProviderResult<Refresh<T>> {
        match self.fetch::<T>(path).await? {
            Some(object) => {
                let status = object.lifecycle_status().to_string();
                Ok(Refresh::found(object, status))
            }
            None => Ok(Refresh::Gone),
        }
    }

    /// Status waiter with this provider's poll interval
    pub(crate) fn waiter(&self, description: impl Into<String>, timeout: Duration) -> StatusWaiter {
        StatusWaiter::new(description)
            .poll_interval(self.config.poll_interval)
            .timeout(self.config.effective_timeout(timeout))
    }

    /// Poll the object at `path` until `waiter` settles
    pub(crate) async fn wait_for<T>(&self, path: &str, waiter: StatusWaiter) -> ProviderResult<Option<T>>
    where
        T: DeserializeOwned + Lifecycle + Send,
    {
        debug!("waiting for {}", waiter.description());
        waiter
            .wait(|| self.refresh::<T>(path))
            .await
            .map_err(ProviderError::from)
    }

    /// Poll until the object at `path` disappears
    pub(crate) async fn wait_until_gone<T>(
        &self,
        path: &str,
        description: &str,
        pending: &[&str],
        timeout: Duration,
    ) -> ProviderResult<()>
    where
        T: DeserializeOwned + Lifecycle + Send,
    {
        let waiter = self
            .waiter(format!("{} deletion", description), timeout)
            .pending(pending)
            .failed(&["failed"])
            .gone_is_target();
        self.wait_for::<T>(path, waiter).await.map(|_| ())
    }

    /// DELETE an object; `false` when it was already gone
    pub(crate) async fn delete_object(&self, path: &str) -> ProviderResult<bool> {
        match self.client.delete(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                debug!("{} already deleted", path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Flattened attributes of the object at `path`
    pub(crate) async fn fetch_flat<T: DeserializeOwned + Flatten>(
        &self,
        path: &str,
    ) -> ProviderResult<Option<HashMap<String, Value>>> {
        Ok(self.fetch::<T>(path).await?.map(|object| object.flatten()))
    }

    /// Build the state of one object from its flattened attributes
    pub(crate) fn to_state(
        &self,
        config: &ResourceConfig,
        id: &ResourceId,
        parent: Option<&str>,
        object_id: &str,
        mut attributes: HashMap<String, Value>,
    ) -> State {
        if let (Some(attr), Some(parent)) = (config.parent_attribute, parent) {
            attributes.insert(attr.to_string(), Value::String(parent.to_string()));
        }
        let attributes = (config.schema)().project(attributes);
        State::existing(id.clone(), attributes).with_identifier(config.identifier(parent, object_id))
    }

    // =========================================================================
    // Resource operations
    // =========================================================================

    pub(crate) async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };
        let config = self.resource_config(&id.resource_type)?;
        let (parent, object_id) = config.split_identifier(identifier)?;
        let path = config.item_path(identifier)?;

        let attributes = match config.type_name {
            "is_vpc" => self.fetch_flat::<Vpc>(&path).await?,
            "is_subnet" => self.fetch_flat::<Subnet>(&path).await?,
            "is_public_gateway" => self.fetch_flat::<PublicGateway>(&path).await?,
            "is_floating_ip" => self.fetch_flat::<FloatingIp>(&path).await?,
            "is_subnet_reserved_ip" => self.fetch_flat::<ReservedIp>(&path).await?,
            "is_security_group" => self.fetch_flat::<SecurityGroup>(&path).await?,
            "is_security_group_rule" => self.fetch_flat::<SecurityGroupRule>(&path).await?,
            "is_ssh_key" => self.fetch_flat::<Key>(&path).await?,
            "is_flow_log" => self.fetch_flat::<FlowLogCollector>(&path).await?,
            "is_dedicated_host" => self.fetch_flat::<DedicatedHost>(&path).await?,
            "is_share_snapshot" => self.fetch_flat::<ShareSnapshot>(&path).await?,
            "is_bare_metal_server" => self.read_bare_metal_server(&path).await?,
            other => {
                return Err(ProviderError::invalid_input(format!(
                    "Unknown resource type: {}",
                    other
                )));
            }
        };

        Ok(match attributes {
            Some(attributes) => self.to_state(config, id, parent, object_id, attributes),
            None => State::not_found(id.clone()),
        })
    }

    pub(crate) async fn list_resources(
        &self,
        resource_type: &str,
        filters: &HashMap<String, String>,
    ) -> ProviderResult<Vec<State>> {
        let config = self.resource_config(resource_type)?;
        let parent = config
            .parent_attribute
            .and_then(|attr| filters.get(attr))
            .map(String::as_str);
        let path = config.collection(parent)?;

        let mut query = Vec::new();
        if let Some(group) = filters.get("resource_group") {
            query.push(("resource_group.id".to_string(), group.clone()));
        }
        let items = list_all(self.client.as_ref(), &path, config.collection_key, &query).await?;

        let mut states = Vec::new();
        for item in items {
            let object_id = created_id(&item)?;
            let attributes = match config.type_name {
                "is_vpc" => decode::<Vpc>(item)?.flatten(),
                "is_subnet" => decode::<Subnet>(item)?.flatten(),
                "is_public_gateway" => decode::<PublicGateway>(item)?.flatten(),
                "is_floating_ip" => decode::<FloatingIp>(item)?.flatten(),
                "is_subnet_reserved_ip" => decode::<ReservedIp>(item)?.flatten(),
                "is_security_group" => decode::<SecurityGroup>(item)?.flatten(),
                "is_security_group_rule" => decode::<SecurityGroupRule>(item)?.flatten(),
                "is_ssh_key" => decode::<Key>(item)?.flatten(),
                "is_flow_log" => decode::<FlowLogCollector>(item)?.flatten(),
                "is_dedicated_host" => decode::<DedicatedHost>(item)?.flatten(),
                "is_share_snapshot" => decode::<ShareSnapshot>(item)?.flatten(),
                "is_bare_metal_server" => decode::<BareMetalServer>(item)?.flatten(),
                _ => HashMap::new(),
            };
            let id = ResourceId::new(config.type_name, object_id.clone());
            let state = self.to_state(config, &id, parent, &object_id, attributes);
            if matches_filters(&state.attributes, filters) {
                states.push(state);
            }
        }
        debug!("{}: {} objects after filtering", resource_type, states.len());
        Ok(states)
    }

    /// Check caller attributes against the kind's schema, filling defaults
    pub(crate) fn prepare(&self, resource: &Resource) -> ProviderResult<Resource> {
        let config = self.resource_config(&resource.id.resource_type)?;
        let schema = (config.schema)();
        let mut attributes = resource.attributes.clone();
        schema.apply_defaults(&mut attributes);
        schema.validate(&attributes).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            ProviderError::invalid_input(messages.join("; ")).for_resource(resource.id.clone())
        })?;
        Ok(Resource {
            attributes,
            ..resource.clone()
        })
    }

    pub(crate) async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let resource = self.prepare(&resource)?;
        let config = self.resource_config(&resource.id.resource_type)?;
        info!("creating {}.{}", resource.id.resource_type, resource.id.name);

        let identifier = match config.type_name {
            "is_vpc" => self.create_vpc(&resource).await,
            "is_subnet" => self.create_subnet(&resource).await,
            "is_public_gateway" => self.create_public_gateway(&resource).await,
            "is_floating_ip" => self.create_floating_ip(&resource).await,
            "is_subnet_reserved_ip" => self.create_reserved_ip(&resource).await,
            "is_security_group" => self.create_security_group(&resource).await,
            "is_security_group_rule" => self.create_security_group_rule(&resource).await,
            "is_ssh_key" => self.create_ssh_key(&resource).await,
            "is_flow_log" => self.create_flow_log(&resource).await,
            "is_dedicated_host" => self.create_dedicated_host(&resource).await,
            "is_share_snapshot" => self.create_share_snapshot(&resource).await,
            "is_bare_metal_server" => self.create_bare_metal_server(&resource).await,
            other => Err(ProviderError::invalid_input(format!(
                "Unknown resource type: {}",
                other
            ))),
        }
        .map_err(|e| e.for_resource(resource.id.clone()))?;

        info!(
            "created {}.{} ({})",
            resource.id.resource_type, resource.id.name, identifier
        );
        self.read_existing(&resource.id, &identifier)
            .await
            .map_err(created_as(&identifier))
    }

    pub(crate) async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let config = self.resource_config(&id.resource_type)?;
        let schema = (config.schema)();

        let changed = comparable_attributes(
            &schema,
            changed_attributes(&to.attributes, &from.attributes),
        );
        let replace = replacement_attributes(&schema, &changed);
        if !replace.is_empty() {
            return Err(ProviderError::invalid_input(format!(
                "Cannot update {} in place, replacement required",
                replace.join(", ")
            ))
            .for_resource(id.clone()));
        }

        // Inputs left out of `to` keep their current value
        if let Err(errors) = schema.validate(&to.attributes) {
            let messages: Vec<String> = errors
                .iter()
                .filter(|e| !matches!(e, TypeError::MissingRequired { .. }))
                .map(ToString::to_string)
                .collect();
            if !messages.is_empty() {
                return Err(
                    ProviderError::invalid_input(messages.join("; ")).for_resource(id.clone())
                );
            }
        }
        if changed.is_empty() {
            debug!("{}.{}: nothing to update", id.resource_type, id.name);
            return self.read_existing(id, identifier).await;
        }

        info!(
            "updating {}.{}: {}",
            id.resource_type,
            id.name,
            changed.join(", ")
        );
        let changed: Vec<&str> = changed.iter().map(String::as_str).collect();
        match config.type_name {
            "is_vpc" => self.update_vpc(identifier, &changed, to).await,
            "is_subnet" => self.update_subnet(identifier, &changed, to).await,
            "is_public_gateway" => self.update_name(config, identifier, to).await,
            "is_floating_ip" => self.update_floating_ip(identifier, &changed, to).await,
            "is_subnet_reserved_ip" => self.update_reserved_ip(identifier, &changed, to).await,
            "is_security_group" => self.update_name(config, identifier, to).await,
            "is_security_group_rule" => {
                self.update_security_group_rule(identifier, &changed, from, to).await
            }
            "is_ssh_key" => self.update_name(config, identifier, to).await,
            "is_flow_log" => self.update_flow_log(identifier, &changed, to).await,
            "is_dedicated_host" => self.update_dedicated_host(identifier, &changed, to).await,
            "is_share_snapshot" => self.update_share_snapshot(identifier, &changed, to).await,
            "is_bare_metal_server" => self.update_name(config, identifier, to).await,
            other => Err(ProviderError::invalid_input(format!(
                "Unknown resource type: {}",
                other
            ))),
        }
        .map_err(|e| e.for_resource(id.clone()))?;

        self.read_existing(id, identifier).await
    }

    pub(crate) async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let config = self.resource_config(&id.resource_type)?;
        info!("deleting {}.{} ({})", id.resource_type, id.name, identifier);

        match config.type_name {
            "is_vpc" => self.delete_vpc(identifier).await,
            "is_subnet" => self.delete_subnet(identifier).await,
            "is_public_gateway" => self.delete_public_gateway(identifier).await,
            "is_floating_ip" => self.delete_floating_ip(identifier).await,
            "is_flow_log" => self.delete_flow_log(identifier).await,
            "is_dedicated_host" => self.delete_dedicated_host(identifier).await,
            "is_share_snapshot" => self.delete_share_snapshot(identifier).await,
            "is_bare_metal_server" => self.delete_bare_metal_server(identifier).await,
            // No lifecycle status to wait on
            _ => self
                .delete_object(&config.item_path(identifier)?)
                .await
                .map(|_| ()),
        }
        .map_err(|e| e.for_resource(id.clone()))?;

        info!("deleted {}.{}", id.resource_type, id.name);
        Ok(())
    }

    /// Read an object that must exist
    async fn read_existing(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let state = self.read_resource(id, Some(identifier)).await?;
        if !state.exists {
            return Err(ProviderError::not_found(format!(
                "{} disappeared after the operation",
                identifier
            ))
            .for_resource(id.clone()));
        }
        Ok(state)
    }
}

/// Whether every filter equals the attribute of the same name
fn matches_filters(attributes: &HashMap<String, Value>, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| match attributes.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Int(i)) => i.to_string() == *expected,
        Some(Value::Bool(b)) => b.to_string() == *expected,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, Method};
    use crate::testing::{MockApi, provider_for};
    use serde_json::json;
    use vpcform_core::provider::ErrorKind;

    #[tokio::test]
    async fn read_404_is_not_found_state() {
        let api = MockApi::new();
        api.not_found(Method::Get, "/vpcs/r006-gone");
        let provider = provider_for(api);

        let id = ResourceId::new("is_vpc", "main");
        let state = provider.read_resource(&id, Some("r006-gone")).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let provider = provider_for(MockApi::new());
        let id = ResourceId::new("is_vpc", "main");
        let state = provider.read_resource(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn read_other_errors_propagate() {
        let api = MockApi::new();
        api.on(
            Method::Get,
            "/vpcs/r006-vpc",
            Err(ApiError::new(500, "internal_error", "boom")),
        );
        let provider = provider_for(api);

        let id = ResourceId::new("is_vpc", "main");
        let err = provider.read_resource(&id, Some("r006-vpc")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Other);
    }

    #[tokio::test]
    async fn read_projects_through_schema() {
        let api = MockApi::new();
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("available")));
        let provider = provider_for(api);

        let id = ResourceId::new("is_vpc", "main");
        let state = provider.read_resource(&id, Some("r006-vpc")).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("r006-vpc"));
        assert_eq!(state.get_str("name"), Some("main"));
        assert!(!state.attributes.contains_key("href"));
    }

    #[tokio::test]
    async fn read_sparse_object() {
        let api = MockApi::new();
        api.on(
            Method::Get,
            "/vpcs/r006-vpc",
            Ok(json!({"id": "r006-vpc", "status": "available"})),
        );
        let provider = provider_for(api);

        let id = ResourceId::new("is_vpc", "main");
        let state = provider.read_resource(&id, Some("r006-vpc")).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.get_str("status"), Some("available"));
        assert!(!state.attributes.contains_key("crn"));
        assert!(!state.attributes.contains_key("name"));
    }

    #[tokio::test]
    async fn nested_read_sets_parent_attribute() {
        let api = MockApi::new();
        api.on(
            Method::Get,
            "/shares/r006-share/snapshots/r006-snap",
            Ok(snapshot_json("stable")),
        );
        let provider = provider_for(api);

        let id = ResourceId::new("is_share_snapshot", "nightly");
        let state = provider
            .read_resource(&id, Some("r006-share/r006-snap"))
            .await
            .unwrap();
        assert_eq!(state.get_str("share"), Some("r006-share"));
        assert_eq!(state.identifier.as_deref(), Some("r006-share/r006-snap"));
    }

    #[tokio::test]
    async fn unknown_type_is_invalid_input() {
        let provider = provider_for(MockApi::new());
        let id = ResourceId::new("is_instance", "vm");
        let err = provider.read_resource(&id, Some("x")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn list_applies_filters() {
        let api = MockApi::new();
        let mut second = subnet_json("available", None);
        second["id"] = json!("r006-subnet-2");
        second["name"] = json!("db");
        second["zone"] = json!({"name": "us-south-2"});
        api.on(
            Method::Get,
            "/subnets",
            Ok(json!({"subnets": [subnet_json("available", None), second]})),
        );
        let provider = provider_for(api.clone());

        let all = provider.list_resources("is_subnet", &HashMap::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let mut filters = HashMap::new();
        filters.insert("zone".to_string(), "us-south-2".to_string());
        filters.insert("resource_group".to_string(), "rg-1".to_string());
        let filtered = provider.list_resources("is_subnet", &filters).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].get_str("name"), Some("db"));
        assert_eq!(filtered[0].identifier.as_deref(), Some("r006-subnet-2"));

        let last = api.calls().pop().unwrap();
        assert!(
            last.query
                .contains(&("resource_group.id".to_string(), "rg-1".to_string()))
        );
    }

    #[tokio::test]
    async fn list_keeps_collectors_with_unlisted_targets() {
        let api = MockApi::new();
        let mut other = collector_json("stable", true);
        other["id"] = json!("r006-flow-2");
        other["target"] = json!({
            "resource_type": "bare_metal_server_network_interface",
            "id": "0717-nic"
        });
        api.on(
            Method::Get,
            "/flow_log_collectors",
            Ok(json!({"flow_log_collectors": [collector_json("stable", true), other]})),
        );
        let provider = provider_for(api);

        let collectors = provider
            .list_resources("is_flow_log", &HashMap::new())
            .await
            .unwrap();
        assert_eq!(collectors.len(), 2);
        assert_eq!(collectors[0].get_str("target"), Some("r006-subnet"));
        assert_eq!(collectors[1].identifier.as_deref(), Some("r006-flow-2"));
        assert!(!collectors[1].attributes.contains_key("target"));
    }

    #[tokio::test]
    async fn nested_list_requires_parent() {
        let provider = provider_for(MockApi::new());
        let err = provider
            .list_resources("is_security_group_rule", &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn nested_list_uses_parent_path() {
        let api = MockApi::new();
        api.on(
            Method::Get,
            "/security_groups/r006-sg/rules",
            Ok(json!({"rules": group_json()["rules"].clone()})),
        );
        let provider = provider_for(api);

        let mut filters = HashMap::new();
        filters.insert("security_group".to_string(), "r006-sg".to_string());
        let rules = provider
            .list_resources("is_security_group_rule", &filters)
            .await
            .unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].identifier.as_deref(), Some("r006-sg/r006-r1"));
        assert_eq!(rules[0].get_str("security_group"), Some("r006-sg"));
    }

    #[tokio::test]
    async fn update_rejects_force_new_changes() {
        let api = MockApi::new();
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_subnet", "web");
        let mut current = HashMap::new();
        current.insert("name".to_string(), Value::from("web"));
        current.insert("zone".to_string(), Value::from("us-south-1"));
        let from = State::existing(id.clone(), current);
        let to = Resource::new("is_subnet", "web")
            .with_attribute("name", "web")
            .with_attribute("zone", "us-south-2");

        let err = provider
            .update_resource(&id, "r006-subnet", &from, &to)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.message.contains("zone"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn update_without_changes_only_reads() {
        let api = MockApi::new();
        api.on(Method::Get, "/keys/r006-key", Ok(key_json()));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_ssh_key", "deploy");
        let from = provider.read_resource(&id, Some("r006-key")).await.unwrap();
        let to = Resource::new("is_ssh_key", "deploy").with_attribute("name", "deploy");

        provider
            .update_resource(&id, "r006-key", &from, &to)
            .await
            .unwrap();
        assert!(api.calls().iter().all(|c| c.method == Method::Get));
    }

    #[tokio::test]
    async fn update_renames_with_merge_patch() {
        let api = MockApi::new();
        api.on(Method::Get, "/keys/r006-key", Ok(key_json()));
        api.on(Method::Patch, "/keys/r006-key", Ok(key_json()));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_ssh_key", "deploy");
        let from = provider.read_resource(&id, Some("r006-key")).await.unwrap();
        let to = Resource::new("is_ssh_key", "deploy").with_attribute("name", "renamed");

        provider
            .update_resource(&id, "r006-key", &from, &to)
            .await
            .unwrap();
        assert_eq!(
            api.last_body(Method::Patch, "/keys/r006-key"),
            Some(json!({"name": "renamed"}))
        );
    }

    #[tokio::test]
    async fn create_validates_before_calling_api() {
        let api = MockApi::new();
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_vpc", "main").with_attribute("name", "Not Valid");
        let err = provider.create_resource(resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_without_lifecycle_tolerates_404() {
        let api = MockApi::new();
        api.not_found(Method::Delete, "/keys/r006-key");
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_ssh_key", "deploy");
        provider.delete_resource(&id, "r006-key").await.unwrap();
        assert_eq!(api.count(Method::Delete, "/keys/r006-key"), 1);
    }

    #[test]
    fn filters_compare_scalars() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::from("web"));
        attrs.insert("length".to_string(), Value::Int(2048));
        attrs.insert("active".to_string(), Value::Bool(true));

        let mut filters = HashMap::new();
        filters.insert("length".to_string(), "2048".to_string());
        filters.insert("active".to_string(), "true".to_string());
        assert!(matches_filters(&attrs, &filters));

        filters.insert("missing".to_string(), "x".to_string());
        assert!(!matches_filters(&attrs, &filters));
    }
}
