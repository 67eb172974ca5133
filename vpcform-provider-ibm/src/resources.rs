//! Resource type definitions for the IBM Cloud VPC provider

use vpcform_core::provider::{ProviderError, ProviderResult, ResourceType};
use vpcform_core::schema::ResourceSchema;

use crate::config::Timeouts;
use crate::schemas::{compute, network, security};

/// Static description of one resource kind
pub struct ResourceConfig {
    /// Resource type name (e.g., "is_vpc")
    pub type_name: &'static str,
    /// Collection path; `{parent}` stands for the parent id of nested kinds
    pub collection_path: &'static str,
    /// Key of the item array in list responses
    pub collection_key: &'static str,
    /// Attribute carrying the parent id of nested kinds
    pub parent_attribute: Option<&'static str>,
    pub timeouts: Timeouts,
    pub schema: fn() -> ResourceSchema,
}

impl ResourceConfig {
    /// Split an identifier into parent id and object id
    pub fn split_identifier<'a>(
        &self,
        identifier: &'a str,
    ) -> ProviderResult<(Option<&'a str>, &'a str)> {
        match self.parent_attribute {
            None => Ok((None, identifier)),
            Some(parent) => match identifier.split_once('/') {
                Some((p, id)) if !p.is_empty() && !id.is_empty() && !id.contains('/') => {
                    Ok((Some(p), id))
                }
                _ => Err(ProviderError::invalid_input(format!(
                    "Invalid {} identifier '{}': expected <{}>/<id>",
                    self.type_name, identifier, parent
                ))),
            },
        }
    }

    /// Compose the identifier stored in state
    pub fn identifier(&self, parent: Option<&str>, id: &str) -> String {
        match parent {
            Some(p) => format!("{}/{}", p, id),
            None => id.to_string(),
        }
    }

    pub fn collection(&self, parent: Option<&str>) -> ProviderResult<String> {
        match (self.parent_attribute, parent) {
            (None, _) => Ok(self.collection_path.to_string()),
            (Some(_), Some(p)) => Ok(self.collection_path.replace("{parent}", p)),
            (Some(attr), None) => Err(ProviderError::invalid_input(format!(
                "{} requires '{}'",
                self.type_name, attr
            ))),
        }
    }

    /// Path of one object, from its (possibly composite) identifier
    pub fn item_path(&self, identifier: &str) -> ProviderResult<String> {
        let (parent, id) = self.split_identifier(identifier)?;
        Ok(format!("{}/{}", self.collection(parent)?, id))
    }
}

pub const VPC_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_vpc",
    collection_path: "/vpcs",
    collection_key: "vpcs",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: network::vpc_schema,
};

pub const SUBNET_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_subnet",
    collection_path: "/subnets",
    collection_key: "subnets",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: network::subnet_schema,
};

pub const PUBLIC_GATEWAY_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_public_gateway",
    collection_path: "/public_gateways",
    collection_key: "public_gateways",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: network::public_gateway_schema,
};

pub const FLOATING_IP_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_floating_ip",
    collection_path: "/floating_ips",
    collection_key: "floating_ips",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: network::floating_ip_schema,
};

pub const RESERVED_IP_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_subnet_reserved_ip",
    collection_path: "/subnets/{parent}/reserved_ips",
    collection_key: "reserved_ips",
    parent_attribute: Some("subnet"),
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: network::reserved_ip_schema,
};

pub const SECURITY_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_security_group",
    collection_path: "/security_groups",
    collection_key: "security_groups",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: security::security_group_schema,
};

pub const SECURITY_GROUP_RULE_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_security_group_rule",
    collection_path: "/security_groups/{parent}/rules",
    collection_key: "rules",
    parent_attribute: Some("security_group"),
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: security::security_group_rule_schema,
};

pub const SSH_KEY_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_ssh_key",
    collection_path: "/keys",
    collection_key: "keys",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: security::ssh_key_schema,
};

pub const FLOW_LOG_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_flow_log",
    collection_path: "/flow_log_collectors",
    collection_key: "flow_log_collectors",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: security::flow_log_schema,
};

pub const DEDICATED_HOST_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_dedicated_host",
    collection_path: "/dedicated_hosts",
    collection_key: "dedicated_hosts",
    parent_attribute: None,
    timeouts: Timeouts::minutes(10, 10, 20),
    schema: compute::dedicated_host_schema,
};

pub const SHARE_SNAPSHOT_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_share_snapshot",
    collection_path: "/shares/{parent}/snapshots",
    collection_key: "snapshots",
    parent_attribute: Some("share"),
    timeouts: Timeouts::minutes(10, 10, 10),
    schema: compute::share_snapshot_schema,
};

pub const BARE_METAL_SERVER_CONFIG: ResourceConfig = ResourceConfig {
    type_name: "is_bare_metal_server",
    collection_path: "/bare_metal_servers",
    collection_key: "bare_metal_servers",
    parent_attribute: None,
    timeouts: Timeouts::minutes(30, 30, 30),
    schema: compute::bare_metal_server_schema,
};

pub const ALL_CONFIGS: &[&ResourceConfig] = &[
    &VPC_CONFIG,
    &SUBNET_CONFIG,
    &PUBLIC_GATEWAY_CONFIG,
    &FLOATING_IP_CONFIG,
    &RESERVED_IP_CONFIG,
    &SECURITY_GROUP_CONFIG,
    &SECURITY_GROUP_RULE_CONFIG,
    &SSH_KEY_CONFIG,
    &FLOW_LOG_CONFIG,
    &DEDICATED_HOST_CONFIG,
    &SHARE_SNAPSHOT_CONFIG,
    &BARE_METAL_SERVER_CONFIG,
];

/// Get ResourceConfig by resource type name
pub fn get_resource_config(resource_type: &str) -> Option<&'static ResourceConfig> {
    ALL_CONFIGS
        .iter()
        .copied()
        .find(|c| c.type_name == resource_type)
}

macro_rules! define_resource_type {
    ($name:ident, $config:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $config.type_name
            }
            fn schema(&self) -> ResourceSchema {
                ($config.schema)()
            }
        }
    };
}

define_resource_type!(VpcType, VPC_CONFIG);
define_resource_type!(SubnetType, SUBNET_CONFIG);
define_resource_type!(PublicGatewayType, PUBLIC_GATEWAY_CONFIG);
define_resource_type!(FloatingIpType, FLOATING_IP_CONFIG);
define_resource_type!(ReservedIpType, RESERVED_IP_CONFIG);
define_resource_type!(SecurityGroupType, SECURITY_GROUP_CONFIG);
define_resource_type!(SecurityGroupRuleType, SECURITY_GROUP_RULE_CONFIG);
define_resource_type!(SshKeyType, SSH_KEY_CONFIG);
define_resource_type!(FlowLogType, FLOW_LOG_CONFIG);
define_resource_type!(DedicatedHostType, DEDICATED_HOST_CONFIG);
define_resource_type!(ShareSnapshotType, SHARE_SNAPSHOT_CONFIG);
define_resource_type!(BareMetalServerType, BARE_METAL_SERVER_CONFIG);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(VpcType),
        Box::new(SubnetType),
        Box::new(PublicGatewayType),
        Box::new(FloatingIpType),
        Box::new(ReservedIpType),
        Box::new(SecurityGroupType),
        Box::new(SecurityGroupRuleType),
        Box::new(SshKeyType),
        Box::new(FlowLogType),
        Box::new(DedicatedHostType),
        Box::new(ShareSnapshotType),
        Box::new(BareMetalServerType),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configs_match_schemas() {
        for config in ALL_CONFIGS {
            assert_eq!((config.schema)().resource_type, config.type_name);
            if let Some(parent) = config.parent_attribute {
                let schema = (config.schema)();
                let attr = schema.attributes.get(parent).unwrap();
                assert!(attr.required && attr.force_new);
            }
        }
        assert_eq!(resource_types().len(), ALL_CONFIGS.len());
    }

    #[test]
    fn composite_identifiers() {
        let path = SHARE_SNAPSHOT_CONFIG.item_path("r006-share/r006-snap").unwrap();
        assert_eq!(path, "/shares/r006-share/snapshots/r006-snap");

        let path = RESERVED_IP_CONFIG.item_path("r006-subnet/0717-rip").unwrap();
        assert_eq!(path, "/subnets/r006-subnet/reserved_ips/0717-rip");

        assert!(SECURITY_GROUP_RULE_CONFIG.item_path("r006-rule").is_err());
        assert!(SECURITY_GROUP_RULE_CONFIG.item_path("sg/").is_err());
        assert!(SECURITY_GROUP_RULE_CONFIG.item_path("a/b/c").is_err());
    }

    #[test]
    fn plain_identifiers() {
        assert_eq!(VPC_CONFIG.item_path("r006-vpc").unwrap(), "/vpcs/r006-vpc");
        assert_eq!(VPC_CONFIG.identifier(None, "r006-vpc"), "r006-vpc");
        assert_eq!(
            SECURITY_GROUP_RULE_CONFIG.identifier(Some("r006-sg"), "r006-rule"),
            "r006-sg/r006-rule"
        );
    }

    #[test]
    fn nested_collection_needs_parent() {
        let err = SHARE_SNAPSHOT_CONFIG.collection(None).unwrap_err();
        assert_eq!(err.kind, vpcform_core::provider::ErrorKind::InvalidInput);
        assert_eq!(
            SHARE_SNAPSHOT_CONFIG.collection(Some("r006-share")).unwrap(),
            "/shares/r006-share/snapshots"
        );
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(
            get_resource_config("is_dedicated_host").map(|c| c.timeouts.delete.as_secs()),
            Some(20 * 60)
        );
        assert!(get_resource_config("is_instance").is_none());
    }
}
