//! The property tree.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use crate::data::DataBag;
use crate::token::DeferredString;

/// Ordered mapping of property names to values.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A node in a template's property tree.
///
/// Literal strings and deferred strings are distinct variants: a `String`
/// is never interpolated, even if its text looks like a token marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Deferred(DeferredString),
    List(Vec<PropertyValue>),
    Map(PropertyMap),
}

impl PropertyValue {
    pub fn empty_map() -> Self {
        Self::Map(PropertyMap::new())
    }

    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// A single deferred token, e.g. `PropertyValue::token("stage")`.
    pub fn token(expression: impl AsRef<str>) -> Self {
        Self::Deferred(DeferredString::token(expression))
    }

    /// Parse `text` for token markers, falling back to a literal string.
    pub fn deferred(text: impl Into<String>) -> Self {
        let text = text.into();
        match DeferredString::parse(&text) {
            Some(deferred) => Self::Deferred(deferred),
            None => Self::String(text),
        }
    }

    /// Convert authored JSON, turning every string that carries token
    /// markers into a deferred value.
    pub fn authored(value: Value) -> Self {
        match value {
            Value::String(s) => Self::deferred(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::authored).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::authored(v)))
                    .collect(),
            ),
            other => Self::from(other),
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut PropertyMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<PropertyValue>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a direct child of a mapping.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Render the tree to plain JSON, substituting deferred tokens.
    pub fn render(&self, data: &DataBag) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Deferred(deferred) => Value::String(deferred.render(data)),
            Self::List(items) => Value::Array(items.iter().map(|item| item.render(data)).collect()),
            Self::Map(map) => Value::Object(render_map(map, data)),
        }
    }
}

/// Render every value of a property map.
pub fn render_map(map: &PropertyMap, data: &DataBag) -> serde_json::Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), value.render(data)))
        .collect()
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<DeferredString> for PropertyValue {
    fn from(deferred: DeferredString) -> Self {
        Self::Deferred(deferred)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        Self::List(items)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        Self::Map(map)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Deferred(deferred) => deferred.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}
