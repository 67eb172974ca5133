use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vpcform_core::flatten::{Attributes, Flatten};
use vpcform_core::resource::Value;

use super::common::{Reference, resource_group, timestamp};

/// SSH public key
#[derive(Debug, Clone, Deserialize)]
pub struct Key {
    pub id: String,
    pub name: Option<String>,
    pub crn: Option<String>,
    pub public_key: Option<String>,
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub fingerprint: Option<String>,
    pub length: Option<i64>,
    pub resource_group: Option<Reference>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Flatten for Key {
    fn flatten(&self) -> HashMap<String, Value> {
        let attrs = Attributes::new()
            .opt_string("name", self.name.clone())
            .opt_string("crn", self.crn.clone())
            .opt_string("public_key", self.public_key.clone())
            .opt_string("type", self.key_type.clone())
            .opt_string("fingerprint", self.fingerprint.clone())
            .opt_int("length", self.length)
            .opt_string("created_at", timestamp(&self.created_at));
        resource_group(attrs, &self.resource_group).build()
    }
}

#[cfg(test)]
pub(crate) fn key_json() -> serde_json::Value {
    serde_json::json!({
        "id": "r006-key",
        "name": "deploy",
        "crn": "crn:v1:bluemix:public:is:us-south:a/123::key:r006-key",
        "public_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIB deploy@host",
        "type": "ed25519",
        "fingerprint": "SHA256:yxavE4CIOL2NlsqcurRO3xGjkP6m/0mp8ugojH5yxlY",
        "length": 256,
        "resource_group": {"id": "rg-1"},
        "created_at": "2024-01-10T08:30:00Z"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_key() {
        let key: Key = serde_json::from_value(key_json()).unwrap();
        let attrs = key.flatten();
        assert_eq!(attrs.get("type"), Some(&Value::from("ed25519")));
        assert_eq!(attrs.get("length"), Some(&Value::Int(256)));
        assert_eq!(attrs.get("resource_group"), Some(&Value::from("rg-1")));
    }
}
