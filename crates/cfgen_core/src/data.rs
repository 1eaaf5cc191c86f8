//! The data bag used to resolve deferred tokens.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// String-to-string substitution values supplied at build time.
///
/// The engine only ever reads from a data bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBag {
    values: BTreeMap<String, String>,
}

impl DataBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a data bag from an arbitrary JSON value.
    ///
    /// Anything other than a mapping yields an empty bag. Scalar entries are
    /// stringified; null and nested entries are skipped.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            if !value.is_null() {
                warn!("Data bag is not a mapping, using an empty one");
            }
            return Self::new();
        };

        let values = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Number(n) => Some((key, n.to_string())),
                Value::Bool(b) => Some((key, b.to_string())),
                _ => None,
            })
            .collect();

        Self { values }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A new bag holding `self` with every entry of `other` layered on top.
    pub fn overlay(&self, other: &DataBag) -> DataBag {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        DataBag { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DataBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<HashMap<String, String>> for DataBag {
    fn from(values: HashMap<String, String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for DataBag {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}
