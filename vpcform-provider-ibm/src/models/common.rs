use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vpcform_core::flatten::Attributes;
use vpcform_core::resource::Value;

/// Reference to another VPC object (VPC, subnet, ACL, group, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Reference {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub resource_type: Option<String>,
    /// Present when the referenced object has been deleted
    pub deleted: Option<Deleted>,
}

impl Reference {
    /// Name of the referenced object, unless it is gone
    pub fn live_name(&self) -> Option<&str> {
        match self.deleted {
            Some(_) => None,
            None => self.name.as_deref(),
        }
    }

    pub fn block(&self) -> HashMap<String, Value> {
        Attributes::new()
            .string("id", &self.id)
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("resource_type", self.resource_type.clone())
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Deleted {
    pub more_info: String,
}

/// Reference addressed by name only (zones, profiles)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NameReference {
    pub name: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IpAddress {
    pub address: String,
}

/// Reserved IP embedded in a network interface
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReservedIpReference {
    pub address: String,
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusReason {
    pub code: Option<String>,
    pub message: Option<String>,
    pub more_info: Option<String>,
}

pub fn status_reasons(reasons: &[StatusReason]) -> Vec<HashMap<String, Value>> {
    reasons
        .iter()
        .map(|r| {
            Attributes::new()
                .opt_string("code", r.code.clone())
                .opt_string("message", r.message.clone())
                .opt_string("more_info", r.more_info.clone())
                .build()
        })
        .collect()
}

/// Id of an optional reference
pub fn reference_id(reference: &Option<Reference>) -> Option<String> {
    reference.as_ref().map(|r| r.id.clone())
}

/// Name of an optional zone or profile
pub fn name_of(reference: &Option<NameReference>) -> Option<String> {
    reference.as_ref().map(|r| r.name.clone())
}

pub fn timestamp(at: &Option<DateTime<Utc>>) -> Option<String> {
    at.as_ref().map(DateTime::to_rfc3339)
}

/// Attributes shared by most objects: resource group id and name
pub fn resource_group(attrs: Attributes, group: &Option<Reference>) -> Attributes {
    match group {
        Some(group) => attrs
            .string("resource_group", &group.id)
            .opt_string("resource_group_name", group.name.clone()),
        None => attrs,
    }
}
