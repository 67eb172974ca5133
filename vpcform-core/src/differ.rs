//! Differ - Compare desired attributes with current state
//!
//! Decides whether a resource needs creating, which attributes an update
//! must send, and whether any of them can only change by replacement.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
///
/// Only keys present in `desired` are considered; the result is sorted.
pub fn changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .filter(|(key, value)| current.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}

/// Drop attributes a read can never report back
pub fn comparable_attributes(schema: &ResourceSchema, changed: Vec<String>) -> Vec<String> {
    changed
        .into_iter()
        .filter(|name| {
            !schema
                .attributes
                .get(name.as_str())
                .is_some_and(|a| a.write_only)
        })
        .collect()
}

/// Subset of `changed` that the schema marks as force-new
pub fn replacement_attributes(schema: &ResourceSchema, changed: &[String]) -> Vec<String> {
    changed
        .iter()
        .filter(|name| {
            schema
                .attributes
                .get(name.as_str())
                .is_some_and(|a| a.force_new)
        })
        .cloned()
        .collect()
}
