//! Compute and storage resource schema definitions

use vpcform_core::resource::Value;
use vpcform_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types as ibm_types;
use super::{computed, with_common_outputs, with_resource_group};

pub fn dedicated_host_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_dedicated_host")
        .with_description("A host reserved for one account's instances")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Dedicated host name"),
        )
        .attribute(
            AttributeSchema::new("profile", AttributeType::String)
                .required()
                .force_new()
                .with_description("Host profile, e.g. bx2-host-152x608"),
        )
        .attribute(
            AttributeSchema::new("host_group", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the dedicated host group"),
        )
        .attribute(
            AttributeSchema::new("instance_placement_enabled", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description("Whether new instances may be placed on the host"),
        )
        .attribute(computed("lifecycle_state", AttributeType::String))
        .attribute(computed("state", AttributeType::String))
        .attribute(computed("zone", AttributeType::String))
        .attribute(computed("provisionable", AttributeType::Bool))
        .attribute(computed("memory", AttributeType::Int))
        .attribute(computed("available_memory", AttributeType::Int))
        .attribute(computed("socket_count", AttributeType::Int))
        .attribute(computed("vcpu", ibm_types::block_list()))
        .attribute(computed("available_vcpu", ibm_types::block_list()))
        .attribute(computed("supported_instance_profiles", ibm_types::string_list()))
        .attribute(computed("instances", ibm_types::string_list()));
    with_common_outputs(with_resource_group(schema))
}

pub fn bare_metal_server_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_bare_metal_server")
        .with_description("A single-tenant physical server in a VPC")
        .attribute(
            AttributeSchema::new("name", ibm_types::resource_name())
                .required()
                .with_description("Server name"),
        )
        .attribute(
            AttributeSchema::new("profile", AttributeType::String)
                .required()
                .force_new()
                .with_description("Server profile, e.g. bx2-metal-96x384"),
        )
        .attribute(AttributeSchema::new("zone", ibm_types::zone()).required().force_new())
        .attribute(
            AttributeSchema::new("vpc", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("image", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the boot image"),
        )
        .attribute(
            AttributeSchema::new("keys", ibm_types::string_list())
                .required()
                .force_new()
                .with_description("IDs of SSH keys for the administrative user"),
        )
        .attribute(
            AttributeSchema::new("user_data", AttributeType::String)
                .force_new()
                .write_only()
                .with_description("Cloud-init user data"),
        )
        .attribute(
            AttributeSchema::new("primary_subnet", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the subnet of the primary network interface"),
        )
        .attribute(
            AttributeSchema::new("enable_secure_boot", AttributeType::Bool)
                .force_new()
                .with_default(Value::Bool(false)),
        )
        .attribute(computed("status", AttributeType::String))
        .attribute(computed("status_reasons", ibm_types::block_list()))
        .attribute(computed("memory", AttributeType::Int))
        .attribute(computed("bandwidth", AttributeType::Int))
        .attribute(computed("cpu", ibm_types::block_list()))
        .attribute(computed("disks", ibm_types::block_list()))
        .attribute(computed("network_interfaces", ibm_types::block_list()))
        .attribute(computed("primary_network_interface", ibm_types::block_list()))
        .attribute(computed("primary_ip", AttributeType::String))
        .attribute(computed("boot_target", AttributeType::String))
        .attribute(computed("trusted_platform_module", AttributeType::String))
        .attribute(
            computed("user_accounts", ibm_types::block_list())
                .with_description("Accounts created during initialization"),
        );
    with_common_outputs(with_resource_group(schema))
}

pub fn share_snapshot_schema() -> ResourceSchema {
    ResourceSchema::new("is_share_snapshot")
        .with_description("A snapshot of a file share (identifier: <share>/<snapshot>)")
        .attribute(
            AttributeSchema::new("share", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the file share"),
        )
        .attribute(AttributeSchema::new("name", ibm_types::resource_name()))
        .attribute(AttributeSchema::new("user_tags", ibm_types::string_list()))
        .attribute(computed("snapshot_id", AttributeType::String))
        .attribute(computed("lifecycle_state", AttributeType::String))
        .attribute(computed("status", AttributeType::String))
        .attribute(computed("status_reasons", ibm_types::block_list()))
        .attribute(computed("size", AttributeType::Int))
        .attribute(computed("fingerprint", AttributeType::String))
        .attribute(computed("captured_at", AttributeType::String))
        .attribute(computed("zone", AttributeType::String))
        .attribute(computed("resource_group", AttributeType::String))
        .attribute(computed("resource_group_name", AttributeType::String))
        .attribute(computed("crn", AttributeType::String))
        .attribute(computed("created_at", AttributeType::String))
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        dedicated_host_schema(),
        bare_metal_server_schema(),
        share_snapshot_schema(),
    ]
}
