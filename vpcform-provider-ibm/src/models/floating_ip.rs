use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{
    NameReference, Reference, ReservedIpReference, name_of, resource_group, timestamp,
};

#[derive(Debug, Clone, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
    pub zone: Option<NameReference>,
    pub target: Option<FloatingIpTarget>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Object a floating IP is bound to, selected by `resource_type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum FloatingIpTarget {
    NetworkInterface(InterfaceTarget),
    PublicGateway(Reference),
    BareMetalServerNetworkInterface(InterfaceTarget),
    VirtualNetworkInterface(Reference),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceTarget {
    pub id: String,
    pub name: Option<String>,
    pub href: Option<String>,
    pub primary_ip: Option<ReservedIpReference>,
}

impl FloatingIpTarget {
    pub fn id(&self) -> Option<&str> {
        match self {
            FloatingIpTarget::NetworkInterface(nic)
            | FloatingIpTarget::BareMetalServerNetworkInterface(nic) => Some(&nic.id),
            FloatingIpTarget::PublicGateway(r) | FloatingIpTarget::VirtualNetworkInterface(r) => {
                Some(&r.id)
            }
            FloatingIpTarget::Unknown => None,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            FloatingIpTarget::NetworkInterface(_) => "network_interface",
            FloatingIpTarget::PublicGateway(_) => "public_gateway",
            FloatingIpTarget::BareMetalServerNetworkInterface(_) => {
                "bare_metal_server_network_interface"
            }
            FloatingIpTarget::VirtualNetworkInterface(_) => "virtual_network_interface",
            FloatingIpTarget::Unknown => "unknown",
        }
    }

    /// Private address behind the floating IP, for interface targets
    pub fn private_address(&self) -> Option<&str> {
        match self {
            FloatingIpTarget::NetworkInterface(nic)
            | FloatingIpTarget::BareMetalServerNetworkInterface(nic) => {
                nic.primary_ip.as_ref().map(|ip| ip.address.as_str())
            }
            _ => None,
        }
    }
}

impl Lifecycle for FloatingIp {
    fn lifecycle_status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl Flatten for FloatingIp {
    fn flatten(&self) -> HashMap<String, Value> {
        let mut attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("address", self.address.clone())
            .opt_string("status", self.status.clone())
            .opt_string("zone", name_of(&self.zone))
            .opt_string("created_at", timestamp(&self.created_at));

        if let Some(target) = &self.target {
            let block = Attributes::new()
                .string("resource_type", target.resource_type())
                .opt_string("id", target.id())
                .opt_string("primary_ip", target.private_address())
                .build();
            attrs = attrs
                .opt_string("target", target.id())
                .nested("target_list", Some(block));
        }
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn floating_ip_json(status: &str, target: Option<serde_json::Value>) -> serde_json::Value {
    let mut fip = serde_json::json!({
        "id": "r006-fip",
        "name": "web-ip",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::floating-ip:r006-fip",
        "address": "169.48.2.2",
        "status": status,
        "zone": {"name": "us-south-1"},
        "resource_group": {"id": "rg-1", "name": "default"}
    });
    if let Some(target) = target {
        fip["target"] = target;
    }
    fip
}
