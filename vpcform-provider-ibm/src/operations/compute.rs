//! Dedicated host, share snapshot and bare metal server operations

use std::collections::HashMap;

use log::{info, warn};
use serde_json::json;
use vpcform_core::flatten::Flatten;
use vpcform_core::provider::{ProviderError, ProviderResult};
use vpcform_core::resource::{Resource, Value};

use super::{Body, required_str, string_list};
use crate::models::{BareMetalServer, BareMetalServerInitialization, DedicatedHost, ShareSnapshot};
use crate::provider::{IbmVpcProvider, created_as, created_id};
use crate::resources::{BARE_METAL_SERVER_CONFIG, DEDICATED_HOST_CONFIG, SHARE_SNAPSHOT_CONFIG};

const HOST_BUSY: [&str; 3] = ["pending", "updating", "waiting"];

impl IbmVpcProvider {
    // =========================================================================
    // Dedicated host
    // =========================================================================

    pub(crate) async fn create_dedicated_host(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .named("profile", resource, "profile")
            .reference("group", resource, "host_group")
            .attr("instance_placement_enabled", resource, "instance_placement_enabled")
            .resource_group(resource)
            .build();
        let created = self
            .client
            .post(DEDICATED_HOST_CONFIG.collection_path, body)
            .await?;
        let id = created_id(&created)?;
        self.wait_host_stable(&id, DEDICATED_HOST_CONFIG.timeouts.create)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    async fn wait_host_stable(
        &self,
        id: &str,
        timeout: std::time::Duration,
    ) -> ProviderResult<Option<DedicatedHost>> {
        let waiter = self
            .waiter(format!("dedicated host {} to become stable", id), timeout)
            .pending(&HOST_BUSY)
            .target(&["stable"])
            .failed(&["failed", "suspended"]);
        self.wait_for::<DedicatedHost>(&DEDICATED_HOST_CONFIG.item_path(id)?, waiter)
            .await
    }

    pub(crate) async fn update_dedicated_host(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "name" => body.attr("name", to, "name"),
                "instance_placement_enabled" => {
                    body.attr("instance_placement_enabled", to, "instance_placement_enabled")
                }
                _ => body,
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&DEDICATED_HOST_CONFIG.item_path(identifier)?, body.build())
            .await?;
        self.wait_host_stable(identifier, DEDICATED_HOST_CONFIG.timeouts.update)
            .await?;
        Ok(())
    }

    /// Stop placement first; the API refuses to delete a host open to new instances
    pub(crate) async fn delete_dedicated_host(&self, identifier: &str) -> ProviderResult<()> {
        let path = DEDICATED_HOST_CONFIG.item_path(identifier)?;
        let Some(host) = self.fetch::<DedicatedHost>(&path).await? else {
            return Ok(());
        };

        if host.instance_placement_enabled {
            info!("disabling instance placement on dedicated host {}", identifier);
            self.client
                .patch(&path, json!({ "instance_placement_enabled": false }))
                .await?;
            self.wait_host_stable(identifier, DEDICATED_HOST_CONFIG.timeouts.delete)
                .await?;
        }

        if self.delete_object(&path).await? {
            let mut pending = vec!["deleting", "stable"];
            pending.extend(HOST_BUSY);
            self.wait_until_gone::<DedicatedHost>(
                &path,
                &format!("dedicated host {}", identifier),
                &pending,
                DEDICATED_HOST_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Share snapshot
    // =========================================================================

    pub(crate) async fn create_share_snapshot(&self, resource: &Resource) -> ProviderResult<String> {
        let share = required_str(resource, "share")?;
        let body = Body::new()
            .attr("name", resource, "name")
            .attr("user_tags", resource, "user_tags")
            .build();
        let created = self
            .client
            .post(&SHARE_SNAPSHOT_CONFIG.collection(Some(share))?, body)
            .await?;
        let identifier = SHARE_SNAPSHOT_CONFIG.identifier(Some(share), &created_id(&created)?);

        let waiter = self
            .waiter(
                format!("share snapshot {} to become stable", identifier),
                SHARE_SNAPSHOT_CONFIG.timeouts.create,
            )
            .pending(&["pending", "updating"])
            .target(&["stable"])
            .failed(&["failed"]);
        self.wait_for::<ShareSnapshot>(&SHARE_SNAPSHOT_CONFIG.item_path(&identifier)?, waiter)
            .await
            .map_err(created_as(&identifier))?;
        Ok(identifier)
    }

    pub(crate) async fn update_share_snapshot(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "name" => body.attr("name", to, "name"),
                "user_tags" => body.attr("user_tags", to, "user_tags"),
                _ => body,
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&SHARE_SNAPSHOT_CONFIG.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_share_snapshot(&self, identifier: &str) -> ProviderResult<()> {
        let path = SHARE_SNAPSHOT_CONFIG.item_path(identifier)?;
        if self.delete_object(&path).await? {
            self.wait_until_gone::<ShareSnapshot>(
                &path,
                &format!("share snapshot {}", identifier),
                &["deleting", "stable", "pending", "updating"],
                SHARE_SNAPSHOT_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Bare metal server
    // =========================================================================

    pub(crate) async fn create_bare_metal_server(
        &self,
        resource: &Resource,
    ) -> ProviderResult<String> {
        let image = required_str(resource, "image")?;
        let subnet = required_str(resource, "primary_subnet")?;
        let keys: Vec<serde_json::Value> = string_list(resource, "keys")
            .into_iter()
            .map(|id| json!({ "id": id }))
            .collect();
        if keys.is_empty() {
            return Err(ProviderError::invalid_input("'keys' needs at least one key"));
        }

        let mut initialization = json!({ "image": { "id": image }, "keys": keys });
        if let Some(user_data) = resource.get_str("user_data") {
            initialization["user_data"] = json!(user_data);
        }
        let body = Body::new()
            .attr("name", resource, "name")
            .named("profile", resource, "profile")
            .named("zone", resource, "zone")
            .reference("vpc", resource, "vpc")
            .attr("enable_secure_boot", resource, "enable_secure_boot")
            .field("initialization", initialization)
            .field("primary_network_interface", json!({ "subnet": { "id": subnet } }))
            .resource_group(resource)
            .build();

        let created = self
            .client
            .post(BARE_METAL_SERVER_CONFIG.collection_path, body)
            .await?;
        let id = created_id(&created)?;

        let waiter = self
            .waiter(
                format!("bare metal server {} to start", id),
                BARE_METAL_SERVER_CONFIG.timeouts.create,
            )
            .pending(&["pending", "starting"])
            .target(&["running"])
            .failed(&["failed"]);
        self.wait_for::<BareMetalServer>(&BARE_METAL_SERVER_CONFIG.item_path(&id)?, waiter)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    /// Server attributes merged with its initialization
    pub(crate) async fn read_bare_metal_server(
        &self,
        path: &str,
    ) -> ProviderResult<Option<HashMap<String, Value>>> {
        let Some(server) = self.fetch::<BareMetalServer>(path).await? else {
            return Ok(None);
        };
        let mut attributes = server.flatten();
        let initialization = self
            .fetch::<BareMetalServerInitialization>(&format!("{}/initialization", path))
            .await?;
        if let Some(init) = initialization {
            attributes.extend(init.flatten());
        }
        Ok(Some(attributes))
    }

    pub(crate) async fn delete_bare_metal_server(&self, identifier: &str) -> ProviderResult<()> {
        let path = BARE_METAL_SERVER_CONFIG.item_path(identifier)?;
        let timeout = BARE_METAL_SERVER_CONFIG.timeouts.delete;
        match self.client.delete(&path).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_conflict() => {
                warn!(
                    "bare metal server {} refused deletion ({}), stopping it first",
                    identifier, e.message
                );
                self.client
                    .post(&format!("{}/stop", path), json!({ "type": "hard" }))
                    .await?;
                let waiter = self
                    .waiter(format!("bare metal server {} to stop", identifier), timeout)
                    .pending(&["running", "stopping", "starting", "pending", "restarting"])
                    .target(&["stopped"])
                    .failed(&["failed"]);
                self.wait_for::<BareMetalServer>(&path, waiter).await?;
                if !self.delete_object(&path).await? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.wait_until_gone::<BareMetalServer>(
            &path,
            &format!("bare metal server {}", identifier),
            &["deleting", "stopped", "stopping", "running", "pending"],
            timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use vpcform_core::provider::ErrorKind;
    use vpcform_core::resource::{ResourceId, State, Value};

    use super::*;
    use crate::client::{ApiError, Method};
    use crate::models::*;
    use crate::testing::{MockApi, provider_for};

    fn server_resource() -> Resource {
        let mut resource = Resource::new("is_bare_metal_server", "bm")
            .with_attribute("name", "bm-1")
            .with_attribute("profile", "bx2-metal-96x384")
            .with_attribute("zone", "us-south-1")
            .with_attribute("vpc", "r006-vpc")
            .with_attribute("image", "r006-image")
            .with_attribute("primary_subnet", "r006-subnet")
            .with_attribute("user_data", "#cloud-config");
        resource.attributes.insert(
            "keys".to_string(),
            Value::List(vec![Value::from("r006-key")]),
        );
        resource
    }

    #[tokio::test]
    async fn dedicated_host_waits_through_busy_states() {
        let api = MockApi::new();
        api.on(Method::Post, "/dedicated_hosts", Ok(host_json("pending", true)));
        api.on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("pending", true)))
            .on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("updating", true)))
            .on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("stable", true)));
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_dedicated_host", "dh")
            .with_attribute("name", "dh-1")
            .with_attribute("profile", "bx2-host-152x608")
            .with_attribute("host_group", "0717-group");
        let state = provider.create_resource(resource).await.unwrap();

        assert_eq!(state.get_str("lifecycle_state"), Some("stable"));
        let body = api.last_body(Method::Post, "/dedicated_hosts").unwrap();
        assert_eq!(body["group"], json!({"id": "0717-group"}));
        assert_eq!(body["profile"], json!({"name": "bx2-host-152x608"}));
        assert_eq!(body["instance_placement_enabled"], json!(true));
    }

    #[tokio::test]
    async fn dedicated_host_suspended_is_failure() {
        let api = MockApi::new();
        api.on(Method::Post, "/dedicated_hosts", Ok(host_json("pending", true)));
        api.on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("suspended", true)));
        let provider = provider_for(api);

        let resource = Resource::new("is_dedicated_host", "dh")
            .with_attribute("name", "dh-1")
            .with_attribute("profile", "bx2-host-152x608")
            .with_attribute("host_group", "0717-group");
        let err = provider.create_resource(resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::FailedState);
    }

    #[tokio::test]
    async fn dedicated_host_delete_disables_placement_first() {
        let api = MockApi::new();
        api.on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("stable", true)))
            .on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("stable", false)))
            .on(
                Method::Get,
                "/dedicated_hosts/0717-host",
                Err(ApiError::new(404, "not_found", "gone")),
            );
        api.on(
            Method::Patch,
            "/dedicated_hosts/0717-host",
            Ok(host_json("updating", false)),
        );
        api.on(Method::Delete, "/dedicated_hosts/0717-host", Ok(serde_json::Value::Null));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_dedicated_host", "dh");
        provider.delete_resource(&id, "0717-host").await.unwrap();

        assert_eq!(
            api.last_body(Method::Patch, "/dedicated_hosts/0717-host"),
            Some(json!({"instance_placement_enabled": false}))
        );
        let order: Vec<Method> = api
            .calls()
            .iter()
            .filter(|c| c.method != Method::Get)
            .map(|c| c.method)
            .collect();
        assert_eq!(order, vec![Method::Patch, Method::Delete]);
    }

    #[tokio::test]
    async fn dedicated_host_delete_skips_patch_when_placement_disabled() {
        let api = MockApi::new();
        api.on(Method::Get, "/dedicated_hosts/0717-host", Ok(host_json("stable", false)))
            .on(
                Method::Get,
                "/dedicated_hosts/0717-host",
                Err(ApiError::new(404, "not_found", "gone")),
            );
        api.on(Method::Delete, "/dedicated_hosts/0717-host", Ok(serde_json::Value::Null));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_dedicated_host", "dh");
        provider.delete_resource(&id, "0717-host").await.unwrap();
        assert_eq!(api.count(Method::Patch, "/dedicated_hosts/0717-host"), 0);
    }

    #[tokio::test]
    async fn deleted_dedicated_host_is_success() {
        let api = MockApi::new();
        api.not_found(Method::Get, "/dedicated_hosts/0717-host");
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_dedicated_host", "dh");
        provider.delete_resource(&id, "0717-host").await.unwrap();
        assert_eq!(api.count(Method::Delete, "/dedicated_hosts/0717-host"), 0);
    }

    #[tokio::test]
    async fn share_snapshot_create_returns_composite_identifier() {
        let api = MockApi::new();
        api.on(
            Method::Post,
            "/shares/r006-share/snapshots",
            Ok(snapshot_json("pending")),
        );
        api.on(
            Method::Get,
            "/shares/r006-share/snapshots/r006-snap",
            Ok(snapshot_json("pending")),
        )
        .on(
            Method::Get,
            "/shares/r006-share/snapshots/r006-snap",
            Ok(snapshot_json("stable")),
        );
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_share_snapshot", "nightly")
            .with_attribute("share", "r006-share")
            .with_attribute("name", "nightly");
        let state = provider.create_resource(resource).await.unwrap();

        assert_eq!(state.identifier.as_deref(), Some("r006-share/r006-snap"));
        assert_eq!(state.get_str("share"), Some("r006-share"));
        assert_eq!(state.get_str("lifecycle_state"), Some("stable"));
    }

    #[tokio::test]
    async fn share_snapshot_share_change_needs_replacement() {
        let provider = provider_for(MockApi::new());
        let id = ResourceId::new("is_share_snapshot", "nightly");
        let mut current = HashMap::new();
        current.insert("share".to_string(), Value::from("r006-share"));
        let from = State::existing(id.clone(), current);
        let to = Resource::new("is_share_snapshot", "nightly").with_attribute("share", "r006-other");

        let err = provider
            .update_resource(&id, "r006-share/r006-snap", &from, &to)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn bare_metal_create_sends_initialization() {
        let api = MockApi::new();
        api.on(Method::Post, "/bare_metal_servers", Ok(server_json("pending")));
        api.on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("starting")))
            .on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("running")));
        api.on(
            Method::Get,
            "/bare_metal_servers/0717-bms/initialization",
            Ok(initialization_json()),
        );
        let provider = provider_for(api.clone());

        let state = provider.create_resource(server_resource()).await.unwrap();

        assert_eq!(state.get_str("status"), Some("running"));
        assert_eq!(state.get_str("image"), Some("r006-image"));
        assert!(!state.attributes.contains_key("user_data"));

        let body = api.last_body(Method::Post, "/bare_metal_servers").unwrap();
        assert_eq!(
            body["initialization"],
            json!({
                "image": {"id": "r006-image"},
                "keys": [{"id": "r006-key"}],
                "user_data": "#cloud-config"
            })
        );
        assert_eq!(
            body["primary_network_interface"],
            json!({"subnet": {"id": "r006-subnet"}})
        );
        assert_eq!(body["enable_secure_boot"], json!(false));
    }

    #[tokio::test]
    async fn bare_metal_read_tolerates_missing_initialization() {
        let api = MockApi::new();
        api.on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("running")));
        api.not_found(Method::Get, "/bare_metal_servers/0717-bms/initialization");
        let provider = provider_for(api);

        let id = ResourceId::new("is_bare_metal_server", "bm");
        let state = provider.read_resource(&id, Some("0717-bms")).await.unwrap();
        assert!(state.exists);
        assert!(!state.attributes.contains_key("image"));
    }

    #[tokio::test]
    async fn bare_metal_delete_conflict_stops_server() {
        let api = MockApi::new();
        api.conflict(Method::Delete, "/bare_metal_servers/0717-bms")
            .on(
                Method::Delete,
                "/bare_metal_servers/0717-bms",
                Ok(serde_json::Value::Null),
            );
        api.on(
            Method::Post,
            "/bare_metal_servers/0717-bms/stop",
            Ok(serde_json::Value::Null),
        );
        api.on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("stopping")))
            .on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("stopped")))
            .on(Method::Get, "/bare_metal_servers/0717-bms", Ok(server_json("deleting")))
            .on(
                Method::Get,
                "/bare_metal_servers/0717-bms",
                Err(ApiError::new(404, "not_found", "gone")),
            );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_bare_metal_server", "bm");
        provider.delete_resource(&id, "0717-bms").await.unwrap();

        assert_eq!(
            api.last_body(Method::Post, "/bare_metal_servers/0717-bms/stop"),
            Some(json!({"type": "hard"}))
        );
        assert_eq!(api.count(Method::Delete, "/bare_metal_servers/0717-bms"), 2);
    }

    #[tokio::test]
    async fn bare_metal_delete_other_errors_propagate() {
        let api = MockApi::new();
        api.on(
            Method::Delete,
            "/bare_metal_servers/0717-bms",
            Err(ApiError::new(403, "forbidden", "no access")),
        );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_bare_metal_server", "bm");
        let err = provider.delete_resource(&id, "0717-bms").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Other);
        assert_eq!(api.count(Method::Post, "/bare_metal_servers/0717-bms/stop"), 0);
    }
}
