//! Security group, rule, SSH key and flow log operations

use std::net::IpAddr;

use serde_json::{Value as Json, json};
use vpcform_core::provider::{ProviderError, ProviderResult};
use vpcform_core::resource::{Resource, State};

use super::{Body, required_str};
use crate::models::FlowLogCollector;
use crate::provider::{IbmVpcProvider, created_as, created_id};
use crate::resources::{
    FLOW_LOG_CONFIG, SECURITY_GROUP_CONFIG, SECURITY_GROUP_RULE_CONFIG, SSH_KEY_CONFIG,
};

/// Remote of a rule: CIDR block, single address or security group id
fn rule_remote(remote: &str) -> Json {
    if remote.contains('/') {
        json!({ "cidr_block": remote })
    } else if remote.parse::<IpAddr>().is_ok() {
        json!({ "address": remote })
    } else {
        json!({ "id": remote })
    }
}

/// Protocol-specific fields of a rule body
fn protocol_fields(mut body: Body, resource: &Resource) -> ProviderResult<Body> {
    let protocol = resource.get_str("protocol").unwrap_or("all");
    let has = |attr: &str| resource.attributes.contains_key(attr);
    match protocol {
        "tcp" | "udp" => {
            if has("type") || has("code") {
                return Err(ProviderError::invalid_input(format!(
                    "'type' and 'code' only apply to icmp rules, not {}",
                    protocol
                )));
            }
            if let (Some(min), Some(max)) = (resource.get_int("port_min"), resource.get_int("port_max")) {
                if min > max {
                    return Err(ProviderError::invalid_input(format!(
                        "port_min {} is greater than port_max {}",
                        min, max
                    )));
                }
            }
            body = body
                .attr("port_min", resource, "port_min")
                .attr("port_max", resource, "port_max");
        }
        "icmp" => {
            if has("port_min") || has("port_max") {
                return Err(ProviderError::invalid_input(
                    "'port_min' and 'port_max' only apply to tcp and udp rules",
                ));
            }
            if has("code") && !has("type") {
                return Err(ProviderError::invalid_input("icmp 'code' requires 'type'"));
            }
            body = body.attr("type", resource, "type").attr("code", resource, "code");
        }
        _ => {
            if ["port_min", "port_max", "type", "code"].iter().any(|a| has(*a)) {
                return Err(ProviderError::invalid_input(
                    "rules for all protocols take no ports, type or code",
                ));
            }
        }
    }
    Ok(body.field("protocol", protocol))
}

impl IbmVpcProvider {
    // =========================================================================
    // Security group
    // =========================================================================

    pub(crate) async fn create_security_group(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .reference("vpc", resource, "vpc")
            .resource_group(resource)
            .build();
        let created = self
            .client
            .post(SECURITY_GROUP_CONFIG.collection_path, body)
            .await?;
        created_id(&created)
    }

    // =========================================================================
    // Security group rule
    // =========================================================================

    pub(crate) async fn create_security_group_rule(
        &self,
        resource: &Resource,
    ) -> ProviderResult<String> {
        let group = required_str(resource, "security_group")?;
        let mut body = Body::new()
            .attr("direction", resource, "direction")
            .attr("ip_version", resource, "ip_version");
        if let Some(remote) = resource.get_str("remote") {
            body = body.field("remote", rule_remote(remote));
        }
        let body = protocol_fields(body, resource)?;

        let created = self
            .client
            .post(&SECURITY_GROUP_RULE_CONFIG.collection(Some(group))?, body.build())
            .await?;
        let id = created_id(&created)?;
        Ok(SECURITY_GROUP_RULE_CONFIG.identifier(Some(group), &id))
    }

    pub(crate) async fn update_security_group_rule(
        &self,
        identifier: &str,
        changed: &[&str],
        from: &State,
        to: &Resource,
    ) -> ProviderResult<()> {
        // The rule as it will look after the PATCH must still fit its protocol
        let mut merged = Resource::new(&to.id.resource_type, &to.id.name);
        merged.attributes = from.attributes.clone();
        merged.attributes.extend(to.attributes.clone());
        protocol_fields(Body::new(), &merged)?;

        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "direction" | "ip_version" | "port_min" | "port_max" | "type" | "code" => {
                    body.attr(attr, to, attr)
                }
                "remote" => match to.get_str("remote") {
                    Some(remote) => body.field("remote", rule_remote(remote)),
                    None => body,
                },
                _ => body,
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&SECURITY_GROUP_RULE_CONFIG.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }

    // =========================================================================
    // SSH key
    // =========================================================================

    pub(crate) async fn create_ssh_key(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .attr("public_key", resource, "public_key")
            .attr("type", resource, "type")
            .resource_group(resource)
            .build();
        let created = self.client.post(SSH_KEY_CONFIG.collection_path, body).await?;
        created_id(&created)
    }

    // =========================================================================
    // Flow log collector
    // =========================================================================

    pub(crate) async fn create_flow_log(&self, resource: &Resource) -> ProviderResult<String> {
        let body = Body::new()
            .attr("name", resource, "name")
            .reference("target", resource, "target")
            .named("storage_bucket", resource, "storage_bucket")
            .attr("active", resource, "active")
            .resource_group(resource)
            .build();
        let created = self
            .client
            .post(FLOW_LOG_CONFIG.collection_path, body)
            .await?;
        let id = created_id(&created)?;

        let waiter = self
            .waiter(
                format!("flow log collector {} to become stable", id),
                FLOW_LOG_CONFIG.timeouts.create,
            )
            .pending(&["pending", "updating", "waiting"])
            .target(&["stable"])
            .failed(&["failed"]);
        self.wait_for::<FlowLogCollector>(&FLOW_LOG_CONFIG.item_path(&id)?, waiter)
            .await
            .map_err(created_as(&id))?;
        Ok(id)
    }

    pub(crate) async fn update_flow_log(
        &self,
        identifier: &str,
        changed: &[&str],
        to: &Resource,
    ) -> ProviderResult<()> {
        let mut body = Body::new();
        for attr in changed {
            body = match *attr {
                "name" => body.attr("name", to, "name"),
                "active" => body.attr("active", to, "active"),
                _ => body,
            };
        }
        if body.is_empty() {
            return Ok(());
        }
        self.client
            .patch(&FLOW_LOG_CONFIG.item_path(identifier)?, body.build())
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_flow_log(&self, identifier: &str) -> ProviderResult<()> {
        let path = FLOW_LOG_CONFIG.item_path(identifier)?;
        if self.delete_object(&path).await? {
            self.wait_until_gone::<FlowLogCollector>(
                &path,
                &format!("flow log collector {}", identifier),
                &["deleting", "stable", "pending", "updating", "waiting"],
                FLOW_LOG_CONFIG.timeouts.delete,
            )
            .await?;
        }
        Ok(())
    }
}
