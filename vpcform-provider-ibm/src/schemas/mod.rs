//! IBM Cloud VPC resource schema definitions

pub mod compute;
pub mod network;
pub mod security;
pub mod types;

use vpcform_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Returns all IBM Cloud VPC schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(network::schemas());
    schemas.extend(security::schemas());
    schemas.extend(compute::schemas());
    schemas
}

fn computed(name: &str, attr_type: AttributeType) -> AttributeSchema {
    AttributeSchema::new(name, attr_type).computed()
}

fn with_resource_group(schema: ResourceSchema) -> ResourceSchema {
    schema.attribute(
        AttributeSchema::new("resource_group", AttributeType::String)
            .force_new()
            .with_description("ID of the resource group; the account default when omitted"),
    )
}

/// Outputs every top-level object reports
fn with_common_outputs(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(computed("crn", AttributeType::String))
        .attribute(computed("created_at", AttributeType::String))
        .attribute(computed("resource_group_name", AttributeType::String))
}
