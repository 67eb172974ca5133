//! Security resource schema definitions

use vpcform_core::resource::Value;
use vpcform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as ibm_types;
use super::{computed, with_common_outputs, with_resource_group};

/// Protocol of a security group rule
pub fn protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "all".to_string(),
        "icmp".to_string(),
        "tcp".to_string(),
        "udp".to_string(),
    ])
}

pub fn direction() -> AttributeType {
    AttributeType::Enum(vec!["inbound".to_string(), "outbound".to_string()])
}

pub fn security_group_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_security_group")
        .with_description("A stateful firewall attached to network interfaces")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Security group name"),
        )
        .attribute(
            AttributeSchema::new("vpc", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the VPC"),
        )
        .attribute(computed("vpc_name", AttributeType::String))
        .attribute(
            computed("rules", ibm_types::block_list())
                .with_description("Rules, one block per rule"),
        )
        .attribute(computed("targets", ibm_types::string_list()));
    with_common_outputs(with_resource_group(schema))
}

pub fn security_group_rule_schema() -> ResourceSchema {
    ResourceSchema::new("is_security_group_rule")
        .with_description("One rule of a security group (identifier: <security_group>/<rule>)")
        .attribute(
            AttributeSchema::new("security_group", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the security group"),
        )
        .attribute(AttributeSchema::new("direction", direction()).required())
        .attribute(
            AttributeSchema::new("protocol", protocol())
                .force_new()
                .with_default(Value::String("all".to_string())),
        )
        .attribute(
            AttributeSchema::new("remote", AttributeType::String)
                .with_description("CIDR block, IP address or security group ID"),
        )
        .attribute(
            AttributeSchema::new("ip_version", ibm_types::ip_version())
                .with_default(Value::String("ipv4".to_string())),
        )
        .attribute(AttributeSchema::new("port_min", types::port()))
        .attribute(AttributeSchema::new("port_max", types::port()))
        .attribute(
            AttributeSchema::new("type", ibm_types::icmp_type()).with_description("ICMP type"),
        )
        .attribute(
            AttributeSchema::new("code", ibm_types::icmp_code()).with_description("ICMP code"),
        )
        .attribute(computed("rule_id", AttributeType::String))
}

pub fn ssh_key_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_ssh_key")
        .with_description("An SSH public key for instance and bare metal access")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Key name"),
        )
        .attribute(
            AttributeSchema::new("public_key", AttributeType::String)
                .required()
                .force_new()
                .with_description("Public key in OpenSSH format"),
        )
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::Enum(vec!["rsa".to_string(), "ed25519".to_string()]),
            )
            .force_new()
            .with_default(Value::String("rsa".to_string())),
        )
        .attribute(computed("fingerprint", AttributeType::String))
        .attribute(computed("length", AttributeType::Int));
    with_common_outputs(with_resource_group(schema))
}

pub fn flow_log_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_flow_log")
        .with_description("Collects flow logs of a VPC, subnet, instance or interface")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Collector name"),
        )
        .attribute(
            AttributeSchema::new("target", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the VPC, subnet, instance or network interface"),
        )
        .attribute(
            AttributeSchema::new("storage_bucket", AttributeType::String)
                .required()
                .force_new()
                .with_description("Cloud Object Storage bucket receiving the logs"),
        )
        .attribute(
            AttributeSchema::new("active", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description("Whether logs are being collected"),
        )
        .attribute(computed("lifecycle_state", AttributeType::String))
        .attribute(computed("auto_delete", AttributeType::Bool))
        .attribute(computed("target_type", AttributeType::String))
        .attribute(computed("vpc", AttributeType::String));
    with_common_outputs(with_resource_group(schema))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        security_group_schema(),
        security_group_rule_schema(),
        ssh_key_schema(),
        flow_log_schema(),
    ]
}
