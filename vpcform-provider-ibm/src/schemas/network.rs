//! Network resource schema definitions

use vpcform_core::resource::Value;
use vpcform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as ibm_types;
use super::{computed, with_common_outputs, with_resource_group};

pub fn vpc_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_vpc")
        .with_description("A Virtual Private Cloud")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("VPC name, unique in the region"),
        )
        .attribute(
            AttributeSchema::new("classic_access", AttributeType::Bool)
                .force_new()
                .with_default(Value::Bool(false))
                .with_description("Connect the VPC to classic infrastructure"),
        )
        .attribute(
            AttributeSchema::new(
                "address_prefix_management",
                AttributeType::Enum(vec!["auto".to_string(), "manual".to_string()]),
            )
            .force_new()
            .write_only()
            .with_default(Value::String("auto".to_string()))
            .with_description("Create a default address prefix in each zone"),
        )
        .attribute(
            AttributeSchema::new("default_network_acl_name", ibm_types::resource_name())
                .with_description("Name of the default network ACL"),
        )
        .attribute(
            AttributeSchema::new("default_security_group_name", ibm_types::resource_name())
                .with_description("Name of the default security group"),
        )
        .attribute(
            AttributeSchema::new("default_routing_table_name", ibm_types::resource_name())
                .with_description("Name of the default routing table"),
        )
        .attribute(computed("status", AttributeType::String))
        .attribute(computed("health_state", AttributeType::String))
        .attribute(computed("default_network_acl", AttributeType::String))
        .attribute(computed("default_security_group", AttributeType::String))
        .attribute(computed("default_routing_table", AttributeType::String))
        .attribute(computed("cse_source_addresses", ibm_types::block_list()));
    with_common_outputs(with_resource_group(schema))
}

pub fn subnet_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_subnet")
        .with_description("A subnet in one zone of a VPC")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Subnet name"),
        )
        .attribute(
            AttributeSchema::new("vpc", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the VPC"),
        )
        .attribute(
            AttributeSchema::new("zone", ibm_types::zone())
                .required()
                .force_new()
                .with_description("Zone the subnet lives in"),
        )
        .attribute(
            AttributeSchema::new("ipv4_cidr_block", types::cidr())
                .force_new()
                .with_description("IPv4 range; conflicts with total_ipv4_address_count"),
        )
        .attribute(
            AttributeSchema::new("total_ipv4_address_count", types::positive_int())
                .force_new()
                .with_description("Size of an automatically allocated range (power of two)"),
        )
        .attribute(
            AttributeSchema::new("ip_version", ibm_types::ip_version())
                .force_new()
                .with_default(Value::String("ipv4".to_string())),
        )
        .attribute(
            AttributeSchema::new("public_gateway", AttributeType::String)
                .with_description("ID of the attached public gateway; empty to detach"),
        )
        .attribute(
            AttributeSchema::new("network_acl", AttributeType::String)
                .with_description("ID of the network ACL"),
        )
        .attribute(
            AttributeSchema::new("routing_table", AttributeType::String)
                .with_description("ID of the routing table"),
        )
        .attribute(computed("status", AttributeType::String))
        .attribute(computed("vpc_name", AttributeType::String))
        .attribute(computed("available_ipv4_address_count", AttributeType::Int));
    with_common_outputs(with_resource_group(schema))
}

pub fn public_gateway_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_public_gateway")
        .with_description("Outbound internet access for the subnets of one zone")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Public gateway name"),
        )
        .attribute(
            AttributeSchema::new("vpc", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("zone", ibm_types::zone()).required().force_new())
        .attribute(computed("status", AttributeType::String))
        .attribute(
            computed("floating_ip", ibm_types::block_list())
                .with_description("Floating IP bound to the gateway"),
        );
    with_common_outputs(with_resource_group(schema))
}

pub fn floating_ip_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_floating_ip")
        .with_description("A public IP address bound to a zone or a target")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Floating IP name"),
        )
        .attribute(
            AttributeSchema::new("zone", ibm_types::zone())
                .force_new()
                .with_description("Zone to reserve the address in; conflicts with target"),
        )
        .attribute(
            AttributeSchema::new("target", AttributeType::String)
                .with_description("ID of the network interface or gateway to bind to"),
        )
        .attribute(computed("address", AttributeType::String))
        .attribute(computed("status", AttributeType::String))
        .attribute(computed("target_list", ibm_types::block_list()));
    with_common_outputs(with_resource_group(schema))
}

pub fn reserved_ip_schema() -> ResourceSchema {
    ResourceSchema::new("is_subnet_reserved_ip")
        .with_description("An address reserved in a subnet (identifier: <subnet>/<reserved_ip>)")
        .attribute(
            AttributeSchema::new("subnet", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the subnet"),
        )
        .attribute(AttributeSchema::new("name", ibm_types::resource_name()))
        .attribute(
            AttributeSchema::new("address", AttributeType::String)
                .force_new()
                .with_description("Address to reserve; allocated when omitted"),
        )
        .attribute(
            AttributeSchema::new("auto_delete", AttributeType::Bool)
                .with_description("Release the address when its target is deleted"),
        )
        .attribute(
            AttributeSchema::new("target", AttributeType::String)
                .force_new()
                .with_description("ID of the endpoint gateway to bind to"),
        )
        .attribute(computed("reserved_ip", AttributeType::String))
        .attribute(computed("owner", AttributeType::String))
        .attribute(computed("lifecycle_state", AttributeType::String))
        .attribute(computed("target_crn", AttributeType::String))
        .attribute(computed("created_at", AttributeType::String))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        vpc_schema(),
        subnet_schema(),
        public_gateway_schema(),
        floating_ip_schema(),
        reserved_ip_schema(),
    ]
}
