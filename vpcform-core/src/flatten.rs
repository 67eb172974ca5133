//! Flattening - turn nested API objects into flat attribute maps

use std::collections::HashMap;

use crate::resource::Value;

/// Conversion of a remote object into the attribute map declared by its schema
///
/// Implementations are total: absent optional fields are left out of the map.
pub trait Flatten {
    fn flatten(&self) -> HashMap<String, Value>;
}

impl<T: Flatten> Flatten for Box<T> {
    fn flatten(&self) -> HashMap<String, Value> {
        (**self).flatten()
    }
}

/// Builder for flattened attribute maps
#[derive(Debug, Default, Clone)]
pub struct Attributes {
    inner: HashMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.inner.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn opt_string(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.string(key, v),
            None => self,
        }
    }

    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.inner.insert(key.to_string(), Value::Int(value));
        self
    }

    pub fn opt_int(self, key: &str, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.int(key, v),
            None => self,
        }
    }

    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.inner.insert(key.to_string(), Value::Bool(value));
        self
    }

    pub fn opt_bool(self, key: &str, value: Option<bool>) -> Self {
        match value {
            Some(v) => self.bool(key, v),
            None => self,
        }
    }

    /// List of plain strings
    pub fn strings<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = values
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        self.inner.insert(key.to_string(), Value::List(items));
        self
    }

    /// List of nested blocks
    pub fn list<I>(mut self, key: &str, blocks: I) -> Self
    where
        I: IntoIterator<Item = HashMap<String, Value>>,
    {
        let items = blocks.into_iter().map(Value::Map).collect();
        self.inner.insert(key.to_string(), Value::List(items));
        self
    }

    /// Single nested block, stored as a one-element list
    pub fn nested(self, key: &str, block: Option<HashMap<String, Value>>) -> Self {
        match block {
            Some(b) => self.list(key, [b]),
            None => self,
        }
    }

    pub fn map(mut self, key: &str, map: HashMap<String, Value>) -> Self {
        self.inner.insert(key.to_string(), Value::Map(map));
        self
    }

    /// Merge another attribute map, overwriting clashing keys
    pub fn extend(mut self, other: HashMap<String, Value>) -> Self {
        self.inner.extend(other);
        self
    }

    pub fn build(self) -> HashMap<String, Value> {
        self.inner
    }
}

/// Convert JSON value to attribute Value
///
/// `null` maps to `None`; floats are truncated.
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(|f| Value::Int(f as i64))
            }
        }
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().filter_map(json_to_value).collect();
            Some(Value::List(items))
        }
        serde_json::Value::Object(obj) => {
            let map: HashMap<String, Value> = obj
                .iter()
                .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
                .collect();
            Some(Value::Map(map))
        }
    }
}

/// Convert attribute Value to JSON value
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Convert a whole attribute map to a JSON object
pub fn attributes_to_json(attributes: &HashMap<String, Value>) -> serde_json::Value {
    serde_json::Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    )
}
