use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::common::{Reference, reference_id, resource_group, timestamp};

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub vpc: Option<Reference>,
    #[serde(default)]
    pub rules: Vec<SecurityGroupRule>,
    /// Network interfaces, load balancers, endpoint gateways, ...
    #[serde(default)]
    pub targets: Vec<Reference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    pub direction: Option<String>,
    pub ip_version: Option<String>,
    pub remote: Option<RuleRemote>,
    #[serde(flatten)]
    pub protocol: RuleProtocol,
}

/// Protocol-specific part of a rule, selected by the `protocol` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum RuleProtocol {
    All,
    Icmp {
        #[serde(rename = "type")]
        icmp_type: Option<i64>,
        code: Option<i64>,
    },
    Tcp {
        port_min: Option<i64>,
        port_max: Option<i64>,
    },
    Udp {
        port_min: Option<i64>,
        port_max: Option<i64>,
    },
    #[serde(other)]
    Other,
}

impl RuleProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            RuleProtocol::All => "all",
            RuleProtocol::Icmp { .. } => "icmp",
            RuleProtocol::Tcp { .. } => "tcp",
            RuleProtocol::Udp { .. } => "udp",
            RuleProtocol::Other => "other",
        }
    }
}

/// Where matching traffic comes from or goes to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleRemote {
    CidrBlock { cidr_block: String },
    Address { address: String },
    SecurityGroup(Reference),
}

impl RuleRemote {
    /// Remote as a single string: CIDR, IP address or security group id
    pub fn as_str(&self) -> &str {
        match self {
            RuleRemote::CidrBlock { cidr_block } => cidr_block,
            RuleRemote::Address { address } => address,
            RuleRemote::SecurityGroup(group) => &group.id,
        }
    }
}

impl Flatten for SecurityGroupRule {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .string("rule_id", &self.id)
            .opt_string("direction", self.direction.clone())
            .string("protocol", self.protocol.name())
            .opt_string("ip_version", self.ip_version.clone())
            .opt_string("remote", self.remote.as_ref().map(RuleRemote::as_str));

        let attrs = match &self.protocol {
            RuleProtocol::Icmp { icmp_type, code } => {
                attrs.opt_int("type", *icmp_type).opt_int("code", *code)
            }
            RuleProtocol::Tcp { port_min, port_max } | RuleProtocol::Udp { port_min, port_max } => {
                attrs.opt_int("port_min", *port_min).opt_int("port_max", *port_max)
            }
            RuleProtocol::All | RuleProtocol::Other => attrs,
        };
        attrs.build()
    }
}

impl Flatten for SecurityGroup {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("vpc", reference_id(&self.vpc))
            .opt_string("vpc_name", self.vpc.as_ref().and_then(|v| v.name.clone()))
            .list("rules", self.rules.iter().map(Flatten::flatten))
            .strings("targets", self.targets.iter().map(|t| t.id.clone()))
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn group_json() -> serde_json::Value {
    serde_json::json!({
        "id": "r006-sg",
        "name": "web",
        "crn": "crn:v1:bluemix:public:is:us-south:a/123::security-group:r006-sg",
        "vpc": {"id": "r006-vpc", "name": "main"},
        "rules": [
            {"id": "r006-r1", "direction": "inbound", "ip_version": "ipv4",
             "protocol": "tcp", "port_min": 443, "port_max": 443,
             "remote": {"cidr_block": "0.0.0.0/0"}},
            {"id": "r006-r2", "direction": "inbound", "ip_version": "ipv4",
             "protocol": "icmp", "type": 8,
             "remote": {"address": "192.168.3.4"}},
            {"id": "r006-r3", "direction": "outbound", "ip_version": "ipv4",
             "protocol": "all",
             "remote": {"id": "r006-other-sg", "name": "db", "crn": "crn:v1:x"}}
        ],
        "targets": [{"id": "0717-nic", "resource_type": "network_interface"}],
        "resource_group": {"id": "rg-1", "name": "default"}
    })
}
