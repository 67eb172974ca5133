//! IBM Cloud specific attribute types

use std::sync::LazyLock;

use regex::Regex;
use vpcform_core::resource::Value;
use vpcform_core::schema::AttributeType;

use crate::config::VPC_REGIONS;

/// Lowercase letters, digits and hyphens; starts with a letter, no trailing hyphen
const NAME_PATTERN: &str = r"^([a-z]|[a-z][-a-z0-9]*[a-z0-9])$";

const NAME_MAX_LEN: usize = 63;

static NAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(NAME_PATTERN));

/// Name of a VPC object
pub fn resource_name() -> AttributeType {
    AttributeType::Custom {
        name: "ResourceName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validate_name(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let re = NAME_RE.as_ref().map_err(|e| e.to_string())?;
    if name.len() > NAME_MAX_LEN {
        return Err(format!(
            "Invalid name '{}': at most {} characters",
            name, NAME_MAX_LEN
        ));
    }
    if !re.is_match(name) {
        return Err(format!(
            "Invalid name '{}': use lowercase letters, digits and hyphens, starting with a letter",
            name
        ));
    }
    Ok(())
}

/// Availability zone, e.g. "us-south-1"
pub fn zone() -> AttributeType {
    AttributeType::Custom {
        name: "Zone".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                validate_zone(s)
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

pub fn validate_zone(zone: &str) -> Result<(), String> {
    let valid = zone
        .rsplit_once('-')
        .is_some_and(|(region, index)| {
            VPC_REGIONS.contains(&region) && matches!(index, "1" | "2" | "3")
        });
    if valid {
        Ok(())
    } else {
        Err(format!(
            "Invalid zone '{}': expected <region>-<1|2|3>, e.g. us-south-1",
            zone
        ))
    }
}

pub fn ip_version() -> AttributeType {
    AttributeType::Enum(vec!["ipv4".to_string()])
}

/// ICMP type (0-254)
pub fn icmp_type() -> AttributeType {
    AttributeType::Custom {
        name: "IcmpType".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) if (0..=254).contains(n) => Ok(()),
            Value::Int(_) => Err("ICMP type must be between 0 and 254".to_string()),
            _ => Err("Expected integer".to_string()),
        },
    }
}

/// ICMP code (0-255)
pub fn icmp_code() -> AttributeType {
    AttributeType::Custom {
        name: "IcmpCode".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) if (0..=255).contains(n) => Ok(()),
            Value::Int(_) => Err("ICMP code must be between 0 and 255".to_string()),
            _ => Err("Expected integer".to_string()),
        },
    }
}

/// Nested block of mixed scalar values
pub fn block() -> AttributeType {
    AttributeType::Custom {
        name: "Block".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| match value {
            Value::Map(_) => Ok(()),
            _ => Err("Expected block".to_string()),
        },
    }
}

pub fn block_list() -> AttributeType {
    AttributeType::List(Box::new(block()))
}

pub fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}
