use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::common::{Reference, timestamp};

/// Address reserved in a subnet
#[derive(Debug, Clone, Deserialize)]
pub struct ReservedIp {
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub auto_delete: bool,
    /// `provider` or `user`
    pub owner: Option<String>,
    pub lifecycle_state: Option<String>,
    pub target: Option<ReservedIpTarget>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Object bound to a reserved IP, selected by `resource_type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum ReservedIpTarget {
    EndpointGateway(Reference),
    NetworkInterface(Reference),
    BareMetalServerNetworkInterface(Reference),
    LoadBalancer(Reference),
    VpnGateway(Reference),
    VpnServer(Reference),
    VirtualNetworkInterface(Reference),
    #[serde(other)]
    Unknown,
}

impl ReservedIpTarget {
    pub fn id(&self) -> Option<&str> {
        match self {
            ReservedIpTarget::EndpointGateway(r)
            | ReservedIpTarget::NetworkInterface(r)
            | ReservedIpTarget::BareMetalServerNetworkInterface(r)
            | ReservedIpTarget::LoadBalancer(r)
            | ReservedIpTarget::VpnGateway(r)
            | ReservedIpTarget::VpnServer(r)
            | ReservedIpTarget::VirtualNetworkInterface(r) => Some(&r.id),
            ReservedIpTarget::Unknown => None,
        }
    }

    pub fn crn(&self) -> Option<&str> {
        match self {
            ReservedIpTarget::EndpointGateway(r)
            | ReservedIpTarget::LoadBalancer(r)
            | ReservedIpTarget::VpnGateway(r)
            | ReservedIpTarget::VpnServer(r)
            | ReservedIpTarget::VirtualNetworkInterface(r) => r.crn.as_deref(),
            _ => None,
        }
    }
}

impl Flatten for ReservedIp {
    fn flatten(&self) -> HashMap<String, Value> {
        Attributes::new()
            .opt_string("name", self.name.clone())
            .string("reserved_ip", &self.id)
            .opt_string("address", self.address.clone())
            .bool("auto_delete", self.auto_delete)
            .opt_string("owner", self.owner.clone())
            .opt_string("lifecycle_state", self.lifecycle_state.clone())
            .opt_string("target", self.target.as_ref().and_then(ReservedIpTarget::id))
            .opt_string("target_crn", self.target.as_ref().and_then(ReservedIpTarget::crn))
            .opt_string("created_at", timestamp(&self.created_at))
            .build()
    }
}

#[cfg(test)]
pub(crate) fn reserved_ip_json(target: Option<serde_json::Value>) -> serde_json::Value {
    let mut rip = serde_json::json!({
        "id": "0717-rip",
        "name": "db-vip",
        "address": "10.240.0.10",
        "auto_delete": false,
        "owner": "user",
        "lifecycle_state": "stable",
        "resource_type": "subnet_reserved_ip",
        "created_at": "2024-02-02T10:00:00Z"
    });
    if let Some(target) = target {
        rip["target"] = target;
    }
    rip
}
