use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::Lifecycle;
use super::common::{
    NameReference, Reference, StatusReason, name_of, resource_group, status_reasons, timestamp,
};

/// Point-in-time copy of a file share
#[derive(Debug, Clone, Deserialize)]
pub struct ShareSnapshot {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub lifecycle_state: Option<String>,
    /// Data state: available, failed, pending, unusable
    pub status: Option<String>,
    #[serde(default)]
    pub status_reasons: Vec<StatusReason>,
    pub size: Option<i64>,
    pub fingerprint: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_tags: Vec<String>,
    pub zone: Option<NameReference>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Lifecycle for ShareSnapshot {
    fn lifecycle_status(&self) -> &str {
        self.lifecycle_state.as_deref().unwrap_or("")
    }
}

impl Flatten for ShareSnapshot {
    fn flatten(&self) -> HashMap<String, Value> {
        let mut tags = self.user_tags.clone();
        tags.sort();
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .string("snapshot_id", &self.id)
            .opt_string("crn", self.crn.clone())
            .opt_string("lifecycle_state", self.lifecycle_state.clone())
            .opt_string("status", self.status.clone())
            .list("status_reasons", status_reasons(&self.status_reasons))
            .opt_int("size", self.size)
            .opt_string("fingerprint", self.fingerprint.clone())
            .opt_string("captured_at", timestamp(&self.captured_at))
            .strings("user_tags", tags)
            .opt_string("zone", name_of(&self.zone))
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn snapshot_json(lifecycle_state: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "r006-snap",
        "name": "nightly",
        "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::share-snapshot:r006-share/r006-snap",
        "lifecycle_state": lifecycle_state,
        "status": "available",
        "status_reasons": [],
        "size": 10,
        "fingerprint": "r006-fp",
        "captured_at": "2024-05-01T00:00:05Z",
        "user_tags": ["env:prod", "backup"],
        "zone": {"name": "us-south-1"},
        "resource_group": {"id": "rg-1"}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_snapshot_sorts_tags() {
        let snapshot: ShareSnapshot =
            serde_json::from_value(snapshot_json("stable")).unwrap();
        let attrs = snapshot.flatten();
        assert_eq!(
            attrs.get("user_tags"),
            Some(&Value::List(vec![Value::from("backup"), Value::from("env:prod")]))
        );
        assert_eq!(attrs.get("captured_at"), Some(&Value::from("2024-05-01T00:00:05+00:00")));
        assert_eq!(attrs.get("snapshot_id"), Some(&Value::from("r006-snap")));
    }
}
