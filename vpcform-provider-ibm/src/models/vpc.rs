use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::common::{IpAddress, NameReference, Reference, name_of, resource_group, timestamp};
use super::Lifecycle;

#[derive(Debug, Clone, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub status: Option<String>,
    pub classic_access: Option<bool>,
    pub health_state: Option<String>,
    pub default_network_acl: Option<Reference>,
    pub default_security_group: Option<Reference>,
    pub default_routing_table: Option<Reference>,
    pub resource_group: Option<Reference>,
    #[serde(default)]
    pub cse_source_ips: Vec<CseSourceIp>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Cloud service endpoint source address of one zone
#[derive(Debug, Clone, Deserialize)]
pub struct CseSourceIp {
    pub ip: Option<IpAddress>,
    pub zone: Option<NameReference>,
}

impl Lifecycle for Vpc {
    fn lifecycle_status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

fn default_object(attrs: Attributes, key: &str, reference: &Option<Reference>) -> Attributes {
    match reference {
        Some(r) => attrs
            .string(key, &r.id)
            .opt_string(&format!("{}_name", key), r.live_name()),
        None => attrs,
    }
}

impl Flatten for Vpc {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("status", self.status.clone())
            .opt_bool("classic_access", self.classic_access)
            .opt_string("health_state", self.health_state.clone())
            .opt_string("created_at", timestamp(&self.created_at));
        let attrs = default_object(attrs, "default_network_acl", &self.default_network_acl);
        let attrs = default_object(attrs, "default_security_group", &self.default_security_group);
        let attrs = default_object(attrs, "default_routing_table", &self.default_routing_table);
        let attrs = resource_group(attrs, &self.resource_group);

        attrs
            .list(
                "cse_source_addresses",
                self.cse_source_ips.iter().map(|cse| {
                    Attributes::new()
                        .opt_string("address", cse.ip.as_ref().map(|ip| ip.address.clone()))
                        .opt_string("zone_name", name_of(&cse.zone))
                        .build()
                }),
            )
            .build()
    }
}

#[cfg(test)]
pub(crate) fn vpc_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "r006-vpc",
        "name": "main",
        "crn": "crn:v1:bluemix:public:is:us-south:a/123::vpc:r006-vpc",
        "href": "https://us-south.iaas.cloud.ibm.com/v1/vpcs/r006-vpc",
        "status": status,
        "classic_access": false,
        "health_state": "ok",
        "default_network_acl": {"id": "r006-acl", "name": "acl-main"},
        "default_security_group": {"id": "r006-sg", "name": "sg-main"},
        "default_routing_table": {"id": "r006-rt", "name": "rt-main"},
        "resource_group": {"id": "rg-1", "name": "default"},
        "cse_source_ips": [
            {"ip": {"address": "10.16.0.4"}, "zone": {"name": "us-south-1"}}
        ],
        "created_at": "2024-03-01T12:00:00Z"
    })
}
