//! `Vertex`: one graph vertex with local properties and a halt flag.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::VertexId;

/// A vertex-local property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with integers widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Boolean(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

/// A graph vertex as seen by vertex programs and map-reduce jobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    label: String,
    properties: BTreeMap<String, PropertyValue>,
    out_edges: Vec<VertexId>,
    halted: bool,
}

impl Vertex {
    pub fn new(id: VertexId) -> Self {
        Self {
            id,
            label: String::from("vertex"),
            properties: BTreeMap::new(),
            out_edges: Vec::new(),
            halted: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> VertexId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Sets a property, returning the previous value if any.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Targets of this vertex's outgoing edges.
    #[inline]
    pub fn out_edges(&self) -> &[VertexId] {
        &self.out_edges
    }

    #[inline]
    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }

    pub(crate) fn push_out_edge(&mut self, target: VertexId) {
        self.out_edges.push(target);
    }

    /// Removes this vertex from the active set until it receives a message.
    #[inline]
    pub fn vote_to_halt(&mut self) {
        self.halted = true;
    }

    #[inline]
    pub fn activate(&mut self) {
        self.halted = false;
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
