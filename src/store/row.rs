//! Raw result rows returned by the graph store
//!
//! A statement's result is a sequence of rows; each row maps a declared
//! field name to a scalar, a node record, or an edge record. Node and
//! edge records carry the store's internal numeric identity, which is
//! distinct from the external `id` attribute on the record itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{Color, ColorError};

/// A raw attribute value inside a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Color> for Value {
    fn from(color: Color) -> Self {
        Value::Array(
            color
                .channels()
                .iter()
                .map(|c| Value::Int(i64::from(*c)))
                .collect(),
        )
    }
}

impl TryFrom<&Value> for Color {
    type Error = ColorError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Array(items) = value else {
            return Err(ColorError::Malformed);
        };
        if items.len() != 3 {
            return Err(ColorError::Malformed);
        }
        let mut raw = [0i64; 3];
        for (slot, item) in raw.iter_mut().zip(items) {
            *slot = item.as_i64().ok_or(ColorError::Malformed)?;
        }
        Color::try_from(raw)
    }
}

/// Attribute map attached to nodes and edges.
pub type Properties = BTreeMap<String, Value>;

/// A node as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Internal numeric identity, scoped to the store
    pub identity: i64,
    /// Node kind ("Article" or "Tag")
    pub label: String,
    pub properties: Properties,
}

impl NodeRecord {
    pub fn new(identity: i64, label: impl Into<String>) -> Self {
        Self {
            identity,
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a string attribute by name.
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// An edge as returned by the store.
///
/// `start` and `end` are internal node identities; resolving them to
/// external ids is the aggregator's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub identity: i64,
    /// Edge kind (always "Tag" for both link kinds in this store)
    pub edge_type: String,
    /// Internal identity of the source node
    pub start: i64,
    /// Internal identity of the target node
    pub end: i64,
    pub properties: Properties,
}

impl EdgeRecord {
    pub fn new(identity: i64, edge_type: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            identity,
            edge_type: edge_type.into(),
            start,
            end,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// One named field inside a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Scalar(Value),
    Node(NodeRecord),
    Edge(EdgeRecord),
}

/// One result row: an ordered mapping from field names to values.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Row {
    fields: Vec<(String, Field)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Iterate fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
