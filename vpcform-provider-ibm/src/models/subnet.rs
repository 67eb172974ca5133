use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{NameReference, Reference, name_of, reference_id, resource_group, timestamp};

#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub status: Option<String>,
    pub ipv4_cidr_block: Option<String>,
    pub ip_version: Option<String>,
    pub total_ipv4_address_count: Option<i64>,
    pub available_ipv4_address_count: Option<i64>,
    pub zone: Option<NameReference>,
    pub vpc: Option<Reference>,
    pub public_gateway: Option<Reference>,
    pub network_acl: Option<Reference>,
    pub routing_table: Option<Reference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Lifecycle for Subnet {
    fn lifecycle_status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl Subnet {
    /// Attached public gateway, ignoring references to deleted ones
    pub fn attached_gateway(&self) -> Option<&str> {
        self.public_gateway
            .as_ref()
            .filter(|gw| gw.deleted.is_none())
            .map(|gw| gw.id.as_str())
    }
}

impl Flatten for Subnet {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("status", self.status.clone())
            .opt_string("zone", name_of(&self.zone))
            .opt_string("vpc", reference_id(&self.vpc))
            .opt_string("vpc_name", self.vpc.as_ref().and_then(|v| v.name.clone()))
            .opt_string("ipv4_cidr_block", self.ipv4_cidr_block.clone())
            .opt_string("ip_version", self.ip_version.clone())
            .opt_int("total_ipv4_address_count", self.total_ipv4_address_count)
            .opt_int(
                "available_ipv4_address_count",
                self.available_ipv4_address_count,
            )
            .opt_string("public_gateway", self.attached_gateway())
            .opt_string("network_acl", reference_id(&self.network_acl))
            .opt_string("routing_table", reference_id(&self.routing_table))
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn subnet_json(status: &str, gateway: Option<&str>) -> serde_json::Value {
    let mut subnet = serde_json::json!({
        "id": "r006-subnet",
        "name": "web",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::subnet:r006-subnet",
        "status": status,
        "ipv4_cidr_block": "10.240.0.0/24",
        "ip_version": "ipv4",
        "total_ipv4_address_count": 256,
        "available_ipv4_address_count": 251,
        "zone": {"name": "us-south-1"},
        "vpc": {"id": "r006-vpc", "name": "main"},
        "network_acl": {"id": "r006-acl", "name": "acl-main"},
        "routing_table": {"id": "r006-rt", "name": "rt-main"},
        "resource_group": {"id": "rg-1", "name": "default"}
    });
    if let Some(gw) = gateway {
        subnet["public_gateway"] = serde_json::json!({"id": gw, "name": "gw"});
    }
    subnet
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_subnet() {
        let subnet: Subnet =
            serde_json::from_value(subnet_json("available", Some("r006-gw"))).unwrap();
        let attrs = subnet.flatten();
        assert_eq!(attrs.get("zone"), Some(&Value::from("us-south-1")));
        assert_eq!(attrs.get("vpc"), Some(&Value::from("r006-vpc")));
        assert_eq!(attrs.get("public_gateway"), Some(&Value::from("r006-gw")));
        assert_eq!(attrs.get("available_ipv4_address_count"), Some(&Value::Int(251)));
    }

    #[test]
    fn deleted_gateway_is_not_attached() {
        let mut raw = subnet_json("available", Some("r006-gw"));
        raw["public_gateway"]["deleted"] = json!({"more_info": "https://cloud.ibm.com"});
        let subnet: Subnet = serde_json::from_value(raw).unwrap();
        assert_eq!(subnet.attached_gateway(), None);
        assert!(!subnet.flatten().contains_key("public_gateway"));
    }

    #[test]
    fn subnet_without_zone_or_vpc() {
        let subnet: Subnet =
            serde_json::from_value(json!({"id": "r006-subnet", "status": "pending"})).unwrap();
        let attrs = subnet.flatten();
        assert!(!attrs.contains_key("zone"));
        assert!(!attrs.contains_key("vpc"));
        assert_eq!(attrs.get("status"), Some(&Value::from("pending")));
    }
}
