use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{NameReference, Reference, name_of, reference_id, resource_group, timestamp};

#[derive(Debug, Clone, Deserialize)]
pub struct PublicGateway {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub status: Option<String>,
    pub floating_ip: Option<GatewayFloatingIp>,
    pub zone: Option<NameReference>,
    pub vpc: Option<Reference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayFloatingIp {
    pub id: String,
    pub address: Option<String>,
    pub name: Option<String>,
    pub crn: Option<String>,
}

impl Lifecycle for PublicGateway {
    fn lifecycle_status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

impl Flatten for PublicGateway {
    fn flatten(&self) -> HashMap<String, Value> {
        let floating_ip = self.floating_ip.as_ref().map(|fip| {
            Attributes::new()
                .string("id", &fip.id)
                .opt_string("address", fip.address.clone())
                .opt_string("name", fip.name.clone())
                .build()
        });
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("status", self.status.clone())
            .opt_string("zone", name_of(&self.zone))
            .opt_string("vpc", reference_id(&self.vpc))
            .nested("floating_ip", floating_ip)
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn gateway_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "r006-gw",
        "name": "egress",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::public-gateway:r006-gw",
        "status": status,
        "floating_ip": {"id": "r006-fip", "address": "169.48.1.1", "name": "egress-ip"},
        "zone": {"name": "us-south-1"},
        "vpc": {"id": "r006-vpc", "name": "main"},
        "resource_group": {"id": "rg-1"}
    })
}
