//! Extensions container.
//!
//! The container shape is fixed once, when it is created:
//! - [`Extensions::Values`] - arbitrary JSON values (the default)
//! - [`Extensions::Strings`] - plain strings, chosen by a caller that pre-seeds it
//! - [`Extensions::Other`] - any non-object `extensions` member of a structured
//!   document; it cannot take binary-mode extension headers

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Vendor or middleware attributes outside the core schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extensions {
    /// String-keyed plain strings.
    Strings(BTreeMap<String, String>),
    /// String-keyed arbitrary values.
    Values(BTreeMap<String, Value>),
    /// A non-object value decoded from a structured document.
    Other(Value),
}

impl Extensions {
    /// Empty string-to-string container.
    pub fn strings() -> Self {
        Extensions::Strings(BTreeMap::new())
    }

    /// Empty string-to-value container.
    pub fn values() -> Self {
        Extensions::Values(BTreeMap::new())
    }

    /// Number of entries (0 for `Other`).
    pub fn len(&self) -> usize {
        match self {
            Extensions::Strings(map) => map.len(),
            Extensions::Values(map) => map.len(),
            Extensions::Other(_) => 0,
        }
    }

    /// Whether the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an entry as a JSON value.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Extensions::Strings(map) => map.get(key).cloned().map(Value::String),
            Extensions::Values(map) => map.get(key).cloned(),
            Extensions::Other(_) => None,
        }
    }

    /// Iterate entries as `(key, value)` pairs.
    pub fn entries(&self) -> Vec<(&str, Value)> {
        match self {
            Extensions::Strings(map) => map
                .iter()
                .map(|(k, v)| (k.as_str(), Value::String(v.clone())))
                .collect(),
            Extensions::Values(map) => map.iter().map(|(k, v)| (k.as_str(), v.clone())).collect(),
            Extensions::Other(_) => Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        // Objects always land in the value map, matching generic JSON decoding.
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => Extensions::Values(map.into_iter().collect()),
            other => Extensions::Other(other),
        })
    }
}
