use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{Reference, reference_id, resource_group, timestamp};

#[derive(Debug, Clone, Deserialize)]
pub struct FlowLogCollector {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub lifecycle_state: Option<String>,
    pub active: Option<bool>,
    #[serde(default)]
    pub auto_delete: bool,
    pub storage_bucket: Option<StorageBucket>,
    pub target: Option<FlowLogTarget>,
    pub vpc: Option<Reference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageBucket {
    pub name: String,
}

/// Scope of a collector, selected by `resource_type`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum FlowLogTarget {
    Vpc(Reference),
    Subnet(Reference),
    Instance(Reference),
    NetworkInterface(Reference),
    VirtualNetworkInterface(Reference),
    #[serde(other)]
    Unknown,
}

impl FlowLogTarget {
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            FlowLogTarget::Vpc(r)
            | FlowLogTarget::Subnet(r)
            | FlowLogTarget::Instance(r)
            | FlowLogTarget::NetworkInterface(r)
            | FlowLogTarget::VirtualNetworkInterface(r) => Some(r),
            FlowLogTarget::Unknown => None,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            FlowLogTarget::Vpc(_) => "vpc",
            FlowLogTarget::Subnet(_) => "subnet",
            FlowLogTarget::Instance(_) => "instance",
            FlowLogTarget::NetworkInterface(_) => "network_interface",
            FlowLogTarget::VirtualNetworkInterface(_) => "virtual_network_interface",
            FlowLogTarget::Unknown => "unknown",
        }
    }
}

impl Lifecycle for FlowLogCollector {
    fn lifecycle_status(&self) -> &str {
        self.lifecycle_state.as_deref().unwrap_or("")
    }
}

impl Flatten for FlowLogCollector {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("lifecycle_state", self.lifecycle_state.clone())
            .opt_bool("active", self.active)
            .bool("auto_delete", self.auto_delete)
            .opt_string(
                "storage_bucket",
                self.storage_bucket.as_ref().map(|b| b.name.clone()),
            )
            .opt_string(
                "target",
                self.target
                    .as_ref()
                    .and_then(FlowLogTarget::reference)
                    .map(|r| r.id.clone()),
            )
            .opt_string("target_type", self.target.as_ref().map(FlowLogTarget::resource_type))
            .opt_string("vpc", reference_id(&self.vpc))
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn collector_json(lifecycle_state: &str, active: bool) -> serde_json::Value {
    serde_json::json!({
        "id": "r006-flow",
        "name": "audit",
        "crn": "crn:v1:bluemix:public:is:us-south:a/123::flow-log-collector:r006-flow",
        "lifecycle_state": lifecycle_state,
        "active": active,
        "auto_delete": true,
        "storage_bucket": {"name": "flow-logs"},
        "target": {"resource_type": "subnet", "id": "r006-subnet", "name": "web"},
        "vpc": {"id": "r006-vpc", "name": "main"},
        "resource_group": {"id": "rg-1"}
    })
}
