//! VPC, subnet, public gateway, floating IP and reserved IP operations

use log::{debug, warn};
use serde_json::json;
use vpcform_core::lock::NamedLocks;
use vpcform_core::provider::{ProviderError, ProviderResult};
use vpcform_core::resource::Resource;

use super::{Body, required_str};
use crate::models::{FloatingIp, PublicGateway, Subnet, Vpc};
use crate::provider::{IbmVpcProvider, created_as, created_id};
use crate::resources::{
    FLOATING_IP_CONFIG, PUBLIC_GATEWAY_CONFIG, RESERVED_IP_CONFIG, SUBNET_CONFIG, VPC_CONFIG,
};

const DEFAULT_NAMES: [&str; 3] = [
    "default_network_acl_name",
    "default_security_group_name",
    "default_routing_table_name",
];

impl IbmVpcProvider {
    // =========================================================================
    // VPC
    // =========================================================================

    pub(crate) async fn create_vpc(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .attr("classic_access", resource, "classic_access")
            .attr("address_prefix_management", resource, "address_prefix_management")
            .resource_group(resource)
            .build();
        let created = self.client.post(VPC_CONFIG.collection_path, body).await?;
        let id = created_id(&created)?;

        let vpc = self.wait_vpc_available(&id).await.map_err(created_as(&id))?;
        let renames: Vec<&str> = DEFAULT_NAMES
            .into_iter()
            .filter(|attr| resource.attributes.contains_key(*attr))
            .collect();
        if let Some(vpc) = vpc {
            self.rename_vpc_defaults(&vpc, &renames, resource)
                .await
                .map_err(created_as(&id))?;
        }
        Ok(id)
    }

    async fn wait_vpc_available(&self, id: &str) -> ProviderResult<Option<Vpc>> {
        let waiter = self
            .waiter(format!("VPC {} to become available", id), VPC_CONFIG.timeouts.create)
            .pending(&["pending"])
            .target(&["available"])
            .failed(&["failed"]);
        self.wait_for::<Vpc>(&VPC_CONFIG.item_path(id)?, waiter).await
    }

    /// Rename the default ACL, security group and routing table the API
    /// created along with the VPC
    async fn rename_vpc_defaults(
        &self,
        vpc: &Vpc,
        attrs: &[&str],
        resource: &Resource,
    ) -> ProviderResult<()> {
        for attr in attrs {
            let Some(name) = resource.get_str(attr) else {
                continue;
            };
            let path = match *attr {
                "default_network_acl_name" => vpc
                    .default_network_acl
                    .as_ref()
                    .map(|acl| format!("/network_acls/{}", acl.id)),
                "default_security_group_name" => vpc
                    .default_security_group
                    .as_ref()
                    .map(|sg| format!("/security_groups/{}", sg.id)),
                "default_routing_table_name" => vpc
                    .default_routing_table
                    .as_ref()
                    .map(|rt| format!("/vpcs/{}/routing_tables/{}", vpc.id, rt.id)),
                _ => None,
            };
            match path {
                Some(path) => {
                    debug!("renaming {} of VPC {} to {}", attr, vpc.id, name);
                    self.client.patch(&path, json!({ "name": name })).await?;
                }
                None => warn!("VPC {} has no object for {}", vpc.id, attr),
            }
        }
        Ok(())
    }

    pub(crate) async fn update_vpc(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let path = VPC_CONFIG.item_path(identifier)?;
        if changed.contains(&"name") {
            self.client
                .patch(&path, Body::new().attr("name", to, "name").build())
                .await?;
        }

        let renames: Vec<&str> = changed
            .iter()
            .copied()
            .filter(|attr| DEFAULT_NAMES.contains(attr))
            .collect();
        if !renames.is_empty() {
            let vpc = self.fetch::<Vpc>(&path).await?.ok_or_else(|| {
                ProviderError::not_found(format!("VPC {} not found", identifier))
            })?;
            self.rename_vpc_defaults(&vpc, &renames, to).await?;
        }
        Ok(())
    }

    pub(crate) async fn delete_vpc(&self, identifier: &str) -> ProviderResult<()> {
        let path = VPC_CONFIG.item_path(identifier)?;
        if self.delete_object(&path).await? {
            self.wait_until_gone::<Vpc>(
                &path,
                &format!("VPC {}", identifier),
                &["deleting", "available", "pending"],
                VPC_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Subnet
    // =========================================================================

    pub(crate) async fn create_subnet(&self, resource: &Resource) -> ProviderResult<String> {
        let vpc = required_str(resource, "vpc")?;
        let zone = required_str(resource, "zone")?;
        let has_cidr = resource.attributes.contains_key("ipv4_cidr_block");
        let has_count = resource.attributes.contains_key("total_ipv4_address_count");
        if has_cidr == has_count {
            return Err(ProviderError::invalid_input(
                "exactly one of 'ipv4_cidr_block' and 'total_ipv4_address_count' is required",
            ));
        }

        let body = Body::new()
            .attr("name", resource, "name")
            .field("vpc", json!({ "id": vpc }))
            .field("zone", json!({ "name": zone }))
            .attr("ipv4_cidr_block", resource, "ipv4_cidr_block")
            .attr("total_ipv4_address_count", resource, "total_ipv4_address_count")
            .attr("ip_version", resource, "ip_version")
            .reference("public_gateway", resource, "public_gateway")
            .reference("network_acl", resource, "network_acl")
            .reference("routing_table", resource, "routing_table")
            .resource_group(resource)
            .build();

        // Concurrent creates in one zone race for address space
        let guard = self.locks.lock(&NamedLocks::subnet_key(vpc, zone)).await;
        debug!("creating subnet {} under lock '{}'", resource.id.name, guard.key());
        let created = self.client.post(SUBNET_CONFIG.collection_path, body).await?;
        let id = created_id(&created)?;
        self.wait_subnet_available(&id, SUBNET_CONFIG.timeouts.create)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    async fn wait_subnet_available(
        &self,
        id: &str,
        timeout: std::time::Duration,
    ) -> ProviderResult<Option<Subnet>> {
        let waiter = self
            .waiter(format!("subnet {} to become available", id), timeout)
            .pending(&["pending", "updating"])
            .target(&["available"])
            .failed(&["failed"]);
        self.wait_for::<Subnet>(&SUBNET_CONFIG.item_path(id)?, waiter)
            .await
    }

    pub(crate) async fn update_subnet(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let path = SUBNET_CONFIG.item_path(identifier)?;
        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "name" => body.attr("name", to, "name"),
                "network_acl" => body.reference("network_acl", to, "network_acl"),
                "routing_table" => body.reference("routing_table", to, "routing_table"),
                _ => body,
            };
        }
        if !body.is_empty() {
            self.client.patch(&path, body.build()).await?;
        }

        if changed.contains(&"public_gateway") {
            match to.get_str("public_gateway").filter(|gw| !gw.is_empty()) {
                Some(gateway) => {
                    self.client
                        .put(&format!("{}/public_gateway", path), json!({ "id": gateway }))
                        .await?;
                }
                None => {
                    self.detach_public_gateway(identifier).await?;
                }
            }
            self.wait_subnet_available(identifier, SUBNET_CONFIG.timeouts.update)
                .await?;
        }
        Ok(())
    }

    async fn detach_public_gateway(&self, identifier: &str) -> ProviderResult<()> {
        let path = format!("{}/public_gateway", SUBNET_CONFIG.item_path(identifier)?);
        match self.client.delete(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn delete_subnet(&self, identifier: &str) -> ProviderResult<()> {
        let path = SUBNET_CONFIG.item_path(identifier)?;
        match self.client.delete(&path).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_conflict() => {
                let gateway = self
                    .fetch::<Subnet>(&path)
                    .await?
                    .and_then(|s| s.attached_gateway().map(str::to_string));
                let Some(gateway) = gateway else {
                    return Err(e.into());
                };
                warn!(
                    "subnet {} is attached to public gateway {}, detaching before delete",
                    identifier, gateway
                );
                self.detach_public_gateway(identifier).await?;
                self.wait_subnet_available(identifier, SUBNET_CONFIG.timeouts.delete)
                    .await?;
                if !self.delete_object(&path).await? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.wait_until_gone::<Subnet>(
            &path,
            &format!("subnet {}", identifier),
            &["deleting", "available", "pending"],
            SUBNET_CONFIG.timeouts.delete,
        )
        .await
    }

    // =========================================================================
    // Public gateway
    // =========================================================================

    pub(crate) async fn create_public_gateway(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .reference("vpc", resource, "vpc")
            .named("zone", resource, "zone")
            .resource_group(resource)
            .build();
        let created = self
            .client
            .post(PUBLIC_GATEWAY_CONFIG.collection_path, body)
            .await?;
        let id = created_id(&created)?;

        let waiter = self
            .waiter(
                format!("public gateway {} to become available", id),
                PUBLIC_GATEWAY_CONFIG.timeouts.create,
            )
            .pending(&["pending"])
            .target(&["available"])
            .failed(&["failed"]);
        self.wait_for::<PublicGateway>(&PUBLIC_GATEWAY_CONFIG.item_path(&id)?, waiter)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    pub(crate) async fn delete_public_gateway(&self, identifier: &str) -> ProviderResult<()> {
        let path = PUBLIC_GATEWAY_CONFIG.item_path(identifier)?;
        if self.delete_object(&path).await? {
            self.wait_until_gone::<PublicGateway>(
                &path,
                &format!("public gateway {}", identifier),
                &["deleting", "available", "pending"],
                PUBLIC_GATEWAY_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Floating IP
    // =========================================================================

    pub(crate) async fn create_floating_ip(&self, resource: &Resource) -> ProviderResult<String> {
        let mut body = Body::new()
            .attr("name", resource, "name")
            .resource_group(resource);
        // The API takes either a zone or a target to bind at creation
        body = match (resource.get_str("target"), resource.get_str("zone")) {
            (Some(target), _) => body.field("target", json!({ "id": target })),
            (None, Some(zone)) => body.field("zone", json!({ "name": zone })),
            (None, None) => {
                return Err(ProviderError::invalid_input(
                    "one of 'zone' and 'target' is required",
                ));
            }
        };

        let created = self
            .client
            .post(FLOATING_IP_CONFIG.collection_path, body.build())
            .await?;
        let id = created_id(&created)?;

        let waiter = self
            .waiter(
                format!("floating IP {} to become available", id),
                FLOATING_IP_CONFIG.timeouts.create,
            )
            .pending(&["pending"])
            .target(&["available"])
            .failed(&["failed"]);
        self.wait_for::<FloatingIp>(&FLOATING_IP_CONFIG.item_path(&id)?, waiter)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    pub(crate) async fn update_floating_ip(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let mut body = Body::new();
        if changed.contains(&"name") {
            body = body.attr("name", to, "name");
        }
        if changed.contains(&"target") {
            body = match to.get_str("target").filter(|t| !t.is_empty()) {
                Some(target) => body.field("target", json!({ "id": target })),
                // Merge patch: null unbinds
                None => body.field("target", serde_json::Value::Null),
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&FLOATING_IP_CONFIG.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_floating_ip(&self, identifier: &str) -> ProviderResult<()> {
        let path = FLOATING_IP_CONFIG.item_path(identifier)?;
        if self.delete_object(&path).await? {
            self.wait_until_gone::<FloatingIp>(
                &path,
                &format!("floating IP {}", identifier),
                &["deleting", "available", "pending"],
                FLOATING_IP_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Reserved IP
    // =========================================================================

    pub(crate) async fn create_reserved_ip(&self, resource: &Resource) -> ProviderResult<String> {
        let subnet = required_str(resource, "subnet")?;
        let body = Body::new()
            .attr("name", resource, "name")
            .attr("address", resource, "address")
            .attr("auto_delete", resource, "auto_delete")
            .reference("target", resource, "target")
            .build();
        let created = self
            .client
            .post(&RESERVED_IP_CONFIG.collection(Some(subnet))?, body)
            .await?;
        let id = created_id(&created)?;
        Ok(RESERVED_IP_CONFIG.identifier(Some(subnet), &id))
    }

    pub(crate) async fn update_reserved_ip(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "name" => body.attr("name", to, "name"),
                "auto_delete" => body.attr("auto_delete", to, "auto_delete"),
                _ => body,
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&RESERVED_IP_CONFIG.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use vpcform_core::provider::ErrorKind;
    use vpcform_core::resource::{ResourceId, State, Value};

    use crate::client::{ApiError, Method};
    use crate::models::*;
    use crate::testing::{MockApi, provider_for, provider_with_timeout};

    use super::*;

    fn subnet_resource() -> Resource {
        Resource::new("is_subnet", "web")
            .with_attribute("name", "web")
            .with_attribute("vpc", "r006-vpc")
            .with_attribute("zone", "us-south-1")
            .with_attribute("total_ipv4_address_count", 256i64)
    }

    #[tokio::test]
    async fn create_vpc_waits_until_available() {
        let api = MockApi::new();
        api.on(Method::Post, "/vpcs", Ok(vpc_json("pending")));
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("pending")))
            .on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("pending")))
            .on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("available")));
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_vpc", "main").with_attribute("name", "main");
        let state = provider.create_resource(resource).await.unwrap();

        assert_eq!(state.identifier.as_deref(), Some("r006-vpc"));
        assert_eq!(state.get_str("status"), Some("available"));
        // two pending polls, the available one, then the final read
        assert_eq!(api.count(Method::Get, "/vpcs/r006-vpc"), 4);
        assert_eq!(
            api.last_body(Method::Post, "/vpcs"),
            Some(json!({
                "name": "main",
                "classic_access": false,
                "address_prefix_management": "auto"
            }))
        );
    }

    #[tokio::test]
    async fn create_vpc_failed_status_is_error() {
        let api = MockApi::new();
        api.on(Method::Post, "/vpcs", Ok(vpc_json("pending")));
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("failed")));
        let provider = provider_for(api);

        let resource = Resource::new("is_vpc", "main").with_attribute("name", "main");
        let err = provider.create_resource(resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::FailedState);
        assert!(err.resource_id.is_some());
        assert_eq!(err.identifier.as_deref(), Some("r006-vpc"));
    }

    #[tokio::test]
    async fn create_vpc_times_out() {
        let api = MockApi::new();
        api.on(Method::Post, "/vpcs", Ok(vpc_json("pending")));
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("pending")));
        let provider = provider_with_timeout(api, Duration::from_millis(20));

        let resource = Resource::new("is_vpc", "main").with_attribute("name", "main");
        let err = provider.create_resource(resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(err.identifier.as_deref(), Some("r006-vpc"));
    }

    #[tokio::test]
    async fn create_vpc_renames_defaults() {
        let api = MockApi::new();
        api.on(Method::Post, "/vpcs", Ok(vpc_json("pending")));
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("available")));
        api.on(Method::Patch, "/network_acls/r006-acl", Ok(json!({})));
        api.on(Method::Patch, "/vpcs/r006-vpc/routing_tables/r006-rt", Ok(json!({})));
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_vpc", "main")
            .with_attribute("name", "main")
            .with_attribute("default_network_acl_name", "main-acl")
            .with_attribute("default_routing_table_name", "main-rt");
        provider.create_resource(resource).await.unwrap();

        assert_eq!(
            api.last_body(Method::Patch, "/network_acls/r006-acl"),
            Some(json!({"name": "main-acl"}))
        );
        assert_eq!(
            api.last_body(Method::Patch, "/vpcs/r006-vpc/routing_tables/r006-rt"),
            Some(json!({"name": "main-rt"}))
        );
        assert_eq!(api.count(Method::Patch, "/security_groups/r006-sg"), 0);
        let post = api.last_body(Method::Post, "/vpcs").unwrap();
        assert!(post.get("default_network_acl_name").is_none());
    }

    #[tokio::test]
    async fn delete_vpc_waits_until_gone() {
        let api = MockApi::new();
        api.on(Method::Delete, "/vpcs/r006-vpc", Ok(serde_json::Value::Null));
        api.on(Method::Get, "/vpcs/r006-vpc", Ok(vpc_json("deleting")))
            .on(
                Method::Get,
                "/vpcs/r006-vpc",
                Err(ApiError::new(404, "vpc_not_found", "gone")),
            );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_vpc", "main");
        provider.delete_resource(&id, "r006-vpc").await.unwrap();
        assert_eq!(api.count(Method::Get, "/vpcs/r006-vpc"), 2);
    }

    #[tokio::test]
    async fn delete_of_deleted_vpc_succeeds_without_wait() {
        let api = MockApi::new();
        api.not_found(Method::Delete, "/vpcs/r006-vpc");
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_vpc", "main");
        provider.delete_resource(&id, "r006-vpc").await.unwrap();
        assert_eq!(api.count(Method::Get, "/vpcs/r006-vpc"), 0);
    }

    #[tokio::test]
    async fn create_subnet_requires_one_sizing_attribute() {
        let api = MockApi::new();
        let provider = provider_for(api.clone());

        let both = subnet_resource().with_attribute("ipv4_cidr_block", "10.240.0.0/24");
        let err = provider.create_resource(both).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let mut neither = subnet_resource();
        neither.attributes.remove("total_ipv4_address_count");
        let err = provider.create_resource(neither).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.identifier.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_subnet_create_names_the_subnet() {
        let api = MockApi::new();
        api.on(Method::Post, "/subnets", Ok(subnet_json("pending", None)));
        api.on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("failed", None)));
        let provider = provider_for(api);

        let err = provider.create_resource(subnet_resource()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::FailedState);
        assert_eq!(err.identifier.as_deref(), Some("r006-subnet"));
    }

    #[tokio::test]
    async fn create_subnet_sends_references() {
        let api = MockApi::new();
        api.on(Method::Post, "/subnets", Ok(subnet_json("pending", None)));
        api.on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("available", None)));
        let provider = provider_for(api.clone());

        let resource = subnet_resource().with_attribute("network_acl", "r006-acl");
        let state = provider.create_resource(resource).await.unwrap();
        assert_eq!(state.get_str("zone"), Some("us-south-1"));

        let body = api.last_body(Method::Post, "/subnets").unwrap();
        assert_eq!(body["vpc"], json!({"id": "r006-vpc"}));
        assert_eq!(body["zone"], json!({"name": "us-south-1"}));
        assert_eq!(body["network_acl"], json!({"id": "r006-acl"}));
        assert_eq!(body["total_ipv4_address_count"], json!(256));
        assert_eq!(provider.locks.len(), 1);
    }

    #[tokio::test]
    async fn subnet_creates_in_one_zone_are_serialised() {
        let api = MockApi::new();
        api.on(Method::Post, "/subnets", Ok(subnet_json("pending", None)));
        api.on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("available", None)));
        let provider = Arc::new(provider_for(api));

        let key = NamedLocks::subnet_key("r006-vpc", "us-south-1");
        let guard = provider.locks.lock(&key).await;

        let creating = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.create_resource(subnet_resource()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!creating.is_finished());

        drop(guard);
        let state = creating.await.unwrap().unwrap();
        assert!(state.exists);
    }

    #[tokio::test]
    async fn subnet_delete_conflict_detaches_gateway() {
        let api = MockApi::new();
        api.conflict(Method::Delete, "/subnets/r006-subnet")
            .on(Method::Delete, "/subnets/r006-subnet", Ok(serde_json::Value::Null));
        api.on(
            Method::Get,
            "/subnets/r006-subnet",
            Ok(subnet_json("available", Some("r006-gw"))),
        )
        .on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("available", None)))
        .on(
            Method::Get,
            "/subnets/r006-subnet",
            Err(ApiError::new(404, "not_found", "gone")),
        );
        api.on(
            Method::Delete,
            "/subnets/r006-subnet/public_gateway",
            Ok(serde_json::Value::Null),
        );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_subnet", "web");
        provider.delete_resource(&id, "r006-subnet").await.unwrap();

        assert_eq!(
            api.count(Method::Delete, "/subnets/r006-subnet/public_gateway"),
            1
        );
        assert_eq!(api.count(Method::Delete, "/subnets/r006-subnet"), 2);
    }

    #[tokio::test]
    async fn subnet_delete_conflict_without_gateway_fails() {
        let api = MockApi::new();
        api.conflict(Method::Delete, "/subnets/r006-subnet");
        api.on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("available", None)));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_subnet", "web");
        let err = provider.delete_resource(&id, "r006-subnet").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(api.count(Method::Delete, "/subnets/r006-subnet"), 1);
    }

    #[tokio::test]
    async fn update_subnet_attaches_gateway() {
        let api = MockApi::new();
        api.on(
            Method::Put,
            "/subnets/r006-subnet/public_gateway",
            Ok(gateway_json("available")),
        );
        api.on(
            Method::Get,
            "/subnets/r006-subnet",
            Ok(subnet_json("available", Some("r006-gw"))),
        );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_subnet", "web");
        let mut current = std::collections::HashMap::new();
        current.insert("name".to_string(), Value::from("web"));
        let from = State::existing(id.clone(), current);
        let to = Resource::new("is_subnet", "web")
            .with_attribute("name", "web")
            .with_attribute("public_gateway", "r006-gw");

        let state = provider
            .update_resource(&id, "r006-subnet", &from, &to)
            .await
            .unwrap();
        assert_eq!(state.get_str("public_gateway"), Some("r006-gw"));
        assert_eq!(
            api.last_body(Method::Put, "/subnets/r006-subnet/public_gateway"),
            Some(json!({"id": "r006-gw"}))
        );
        assert_eq!(api.count(Method::Patch, "/subnets/r006-subnet"), 0);
    }

    #[tokio::test]
    async fn update_subnet_detaches_gateway_on_empty_value() {
        let api = MockApi::new();
        api.on(
            Method::Delete,
            "/subnets/r006-subnet/public_gateway",
            Ok(serde_json::Value::Null),
        );
        api.on(Method::Get, "/subnets/r006-subnet", Ok(subnet_json("available", None)));
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_subnet", "web");
        let mut current = std::collections::HashMap::new();
        current.insert("public_gateway".to_string(), Value::from("r006-gw"));
        let from = State::existing(id.clone(), current);
        let to = Resource::new("is_subnet", "web").with_attribute("public_gateway", "");

        provider
            .update_resource(&id, "r006-subnet", &from, &to)
            .await
            .unwrap();
        assert_eq!(
            api.count(Method::Delete, "/subnets/r006-subnet/public_gateway"),
            1
        );
    }

    #[tokio::test]
    async fn floating_ip_needs_zone_or_target() {
        let api = MockApi::new();
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_floating_ip", "egress").with_attribute("name", "egress");
        let err = provider.create_resource(resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn floating_ip_target_wins_over_zone() {
        let api = MockApi::new();
        api.on(Method::Post, "/floating_ips", Ok(floating_ip_json("pending", None)));
        api.on(
            Method::Get,
            "/floating_ips/r006-fip",
            Ok(floating_ip_json("available", None)),
        );
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_floating_ip", "egress")
            .with_attribute("name", "egress")
            .with_attribute("zone", "us-south-1")
            .with_attribute("target", "0717-nic");
        provider.create_resource(resource).await.unwrap();

        let body = api.last_body(Method::Post, "/floating_ips").unwrap();
        assert_eq!(body["target"], json!({"id": "0717-nic"}));
        assert!(body.get("zone").is_none());
    }

    #[tokio::test]
    async fn floating_ip_unbind_sends_null_target() {
        let api = MockApi::new();
        api.on(
            Method::Patch,
            "/floating_ips/r006-fip",
            Ok(floating_ip_json("available", None)),
        );
        api.on(
            Method::Get,
            "/floating_ips/r006-fip",
            Ok(floating_ip_json("available", None)),
        );
        let provider = provider_for(api.clone());

        let id = ResourceId::new("is_floating_ip", "egress");
        let mut current = std::collections::HashMap::new();
        current.insert("target".to_string(), Value::from("0717-nic"));
        let from = State::existing(id.clone(), current);
        let to = Resource::new("is_floating_ip", "egress").with_attribute("target", "");

        provider
            .update_resource(&id, "r006-fip", &from, &to)
            .await
            .unwrap();
        assert_eq!(
            api.last_body(Method::Patch, "/floating_ips/r006-fip"),
            Some(json!({"target": null}))
        );
    }

    #[tokio::test]
    async fn reserved_ip_uses_composite_identifier() {
        let api = MockApi::new();
        api.on(
            Method::Post,
            "/subnets/r006-subnet/reserved_ips",
            Ok(reserved_ip_json(None)),
        );
        api.on(
            Method::Get,
            "/subnets/r006-subnet/reserved_ips/0717-rip",
            Ok(reserved_ip_json(None)),
        );
        let provider = provider_for(api.clone());

        let resource = Resource::new("is_subnet_reserved_ip", "vip")
            .with_attribute("subnet", "r006-subnet")
            .with_attribute("name", "vip");
        let state = provider.create_resource(resource).await.unwrap();

        assert_eq!(state.identifier.as_deref(), Some("r006-subnet/0717-rip"));
        assert_eq!(state.get_str("subnet"), Some("r006-subnet"));
        // no lifecycle wait: one GET for the final read
        assert_eq!(
            api.count(Method::Get, "/subnets/r006-subnet/reserved_ips/0717-rip"),
            1
        );
    }
}
