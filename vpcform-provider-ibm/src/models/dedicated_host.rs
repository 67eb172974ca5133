use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{NameReference, Reference, name_of, reference_id, resource_group, timestamp};

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHost {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub lifecycle_state: Option<String>,
    /// Administrative state: available, degraded, migrating, unavailable
    pub state: Option<String>,
    pub profile: Option<NameReference>,
    pub group: Option<Reference>,
    pub zone: Option<NameReference>,
    #[serde(default)]
    pub instance_placement_enabled: bool,
    #[serde(default)]
    pub provisionable: bool,
    pub memory: Option<i64>,
    pub available_memory: Option<i64>,
    pub socket_count: Option<i64>,
    pub vcpu: Option<Vcpu>,
    pub available_vcpu: Option<Vcpu>,
    #[serde(default)]
    pub supported_instance_profiles: Vec<NameReference>,
    #[serde(default)]
    pub instances: Vec<Reference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vcpu {
    pub architecture: Option<String>,
    pub count: Option<i64>,
    pub manufacturer: Option<String>,
}

impl Vcpu {
    fn block(&self) -> HashMap<String, Value> {
        Attributes::new()
            .opt_string("architecture", self.architecture.clone())
            .opt_int("count", self.count)
            .opt_string("manufacturer", self.manufacturer.clone())
            .build()
    }
}

impl Lifecycle for DedicatedHost {
    fn lifecycle_status(&self) -> &str {
        self.lifecycle_state.as_deref().unwrap_or("")
    }
}

impl Flatten for DedicatedHost {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("lifecycle_state", self.lifecycle_state.clone())
            .opt_string("state", self.state.clone())
            .opt_string("profile", name_of(&self.profile))
            .opt_string("host_group", reference_id(&self.group))
            .opt_string("zone", name_of(&self.zone))
            .bool("instance_placement_enabled", self.instance_placement_enabled)
            .bool("provisionable", self.provisionable)
            .opt_int("memory", self.memory)
            .opt_int("available_memory", self.available_memory)
            .opt_int("socket_count", self.socket_count)
            .nested("vcpu", self.vcpu.as_ref().map(Vcpu::block))
            .nested("available_vcpu", self.available_vcpu.as_ref().map(Vcpu::block))
            .strings(
                "supported_instance_profiles",
                self.supported_instance_profiles.iter().map(|p| p.name.clone()),
            )
            .strings("instances", self.instances.iter().map(|i| i.id.clone()))
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn host_json(lifecycle_state: &str, placement: bool) -> serde_json::Value {
    serde_json::json!({
        "id": "0717-host",
        "name": "dh-1",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::dedicated-host:0717-host",
        "lifecycle_state": lifecycle_state,
        "state": "available",
        "profile": {"name": "bx2-host-152x608"},
        "group": {"id": "0717-group", "name": "hosts"},
        "zone": {"name": "us-south-1"},
        "instance_placement_enabled": placement,
        "provisionable": true,
        "memory": 608,
        "available_memory": 600,
        "socket_count": 4,
        "vcpu": {"architecture": "amd64", "count": 152, "manufacturer": "intel"},
        "available_vcpu": {"architecture": "amd64", "count": 150},
        "supported_instance_profiles": [{"name": "bx2-2x8"}, {"name": "bx2-4x16"}],
        "instances": [],
        "resource_group": {"id": "rg-1"}
    })
}
