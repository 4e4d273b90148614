use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::{ModelError, Result};

/// Attribute changes since the last stabilized flush
///
/// `None` records an attribute that is now absent (unset).
pub type Changes = BTreeMap<String, Option<Value>>;

/// Named attribute values of a model
///
/// Keys are unique and iterate in sorted order, which keeps event order
/// deterministic. A key holding `null` is present; an absent key is not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    data: BTreeMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy of `self` overlaid with every entry of `overrides`
    pub fn merged(&self, overrides: &Attributes) -> Attributes {
        let mut data = self.data.clone();
        data.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Attributes { data }
    }

    /// JSON object holding a copy of every attribute
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for Attributes {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }
}

impl From<Attributes> for BTreeMap<String, Value> {
    fn from(attributes: Attributes) -> Self {
        attributes.data
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Objects convert; `null` becomes an empty mapping; anything else is rejected
impl TryFrom<Value> for Attributes {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into()),
            Value::Null => Ok(Attributes::new()),
            other => Err(ModelError::InvalidPayload {
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
