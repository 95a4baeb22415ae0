//! Nested input/result mappings keyed by directed edges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use crate::codec::ScalarValue;
use crate::error::CoreError;
use crate::sequence::Sequence;

/// A directed edge between two node labels. `to` is absent for
/// attributes that belong to a single node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: Option<String>,
}

impl EdgeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
        }
    }

    pub fn node(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
        }
    }

    /// Canonical single-string form, `from->to`, or `from` for node keys.
    pub fn joined(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Some(to) => write!(f, "{}->{}", self.from, to),
            None => f.write_str(&self.from),
        }
    }
}

/// Scalar and sequence attributes recorded for one edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default)]
    pub scalars: BTreeMap<String, ScalarValue>,
    #[serde(default)]
    pub sequences: BTreeMap<String, Sequence>,
}

impl EdgeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.scalars.insert(name.into(), value.into());
        self
    }

    pub fn with_sequence(mut self, name: impl Into<String>, value: impl Into<Sequence>) -> Self {
        self.sequences.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.sequences.is_empty()
    }

    pub fn attribute_count(&self) -> usize {
        self.scalars.len() + self.sequences.len()
    }
}

pub type EdgeMapping = BTreeMap<EdgeKey, EdgeData>;

/// A node identifier as reported by a simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Label(String),
    /// Structured identifier, e.g. `["region_a", "gas", "bus"]`.
    Composite(Vec<String>),
}

impl NodeRef {
    pub fn is_label(&self) -> bool {
        matches!(self, NodeRef::Label(_))
    }

    pub fn into_label(self) -> String {
        match self {
            NodeRef::Label(label) => label,
            NodeRef::Composite(parts) => parts.join("."),
        }
    }
}

impl From<&str> for NodeRef {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawEdgeKey {
    pub from: NodeRef,
    pub to: Option<NodeRef>,
}

impl RawEdgeKey {
    pub fn new(from: impl Into<NodeRef>, to: Option<NodeRef>) -> Self {
        Self {
            from: from.into(),
            to,
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.from.is_label() && self.to.as_ref().is_none_or(NodeRef::is_label)
    }

    fn into_edge_key(self) -> EdgeKey {
        EdgeKey {
            from: self.from.into_label(),
            to: self.to.map(NodeRef::into_label),
        }
    }
}

impl From<EdgeKey> for RawEdgeKey {
    fn from(key: EdgeKey) -> Self {
        Self {
            from: NodeRef::Label(key.from),
            to: key.to.map(NodeRef::Label),
        }
    }
}

pub type RawMapping = BTreeMap<RawEdgeKey, EdgeData>;

/// True when every key already consists of plain labels.
pub fn is_normalized(raw: &RawMapping) -> bool {
    raw.keys().all(RawEdgeKey::is_normalized)
}

/// Turn engine node identifiers into plain string labels.
///
/// Plain labels are moved through untouched, so normalizing an already
/// normalized mapping is a no-op. Keys that render to the same label are
/// merged; an attribute defined under more than one of them is a
/// `KeyCollision` rather than a silent overwrite.
pub fn normalize_keys(raw: RawMapping) -> Result<EdgeMapping, CoreError> {
    let mut mapping = EdgeMapping::new();
    for (key, data) in raw {
        match mapping.entry(key.into_edge_key()) {
            Entry::Vacant(slot) => {
                slot.insert(data);
            }
            Entry::Occupied(mut slot) => {
                let key = slot.key().to_string();
                let existing = slot.get_mut();
                merge_attributes(&key, &mut existing.scalars, data.scalars)?;
                merge_attributes(&key, &mut existing.sequences, data.sequences)?;
            }
        }
    }
    Ok(mapping)
}

fn merge_attributes<V>(
    key: &str,
    existing: &mut BTreeMap<String, V>,
    incoming: BTreeMap<String, V>,
) -> Result<(), CoreError> {
    for (name, value) in incoming {
        match existing.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => {
                return Err(CoreError::KeyCollision {
                    key: key.to_string(),
                    attribute: slot.key().clone(),
                });
            }
        }
    }
    Ok(())
}

/// Lift a normalized mapping back into engine form.
pub fn lift_keys(mapping: EdgeMapping) -> RawMapping {
    mapping
        .into_iter()
        .map(|(key, data)| (RawEdgeKey::from(key), data))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EdgeMapping {
        let mut m = EdgeMapping::new();
        m.insert(
            EdgeKey::new("A", "B"),
            EdgeData::new().with_scalar("nominal_value", 10),
        );
        m.insert(
            EdgeKey::node("C"),
            EdgeData::new().with_sequence("level", vec![0.5, 0.25]),
        );
        m
    }

    #[test]
    fn normalizing_normalized_mapping_is_noop() {
        let mapping = sample();
        let raw = lift_keys(mapping.clone());
        assert!(is_normalized(&raw));
        assert_eq!(normalize_keys(raw).unwrap(), mapping);
    }

    #[test]
    fn composite_nodes_become_labels() {
        let mut raw = RawMapping::new();
        raw.insert(
            RawEdgeKey::new(
                NodeRef::Composite(vec!["region_a".into(), "gas".into()]),
                Some(NodeRef::Label("boiler".into())),
            ),
            EdgeData::new().with_scalar("variable_costs", 0.1),
        );
        assert!(!is_normalized(&raw));

        let mapping = normalize_keys(raw).unwrap();
        let key = EdgeKey::new("region_a.gas", "boiler");
        assert_eq!(
            mapping[&key].scalars["variable_costs"],
            ScalarValue::Float(0.1)
        );
        assert_eq!(normalize_keys(lift_keys(mapping.clone())).unwrap(), mapping);
    }

    #[test]
    fn colliding_labels_merge_distinct_attributes() {
        let mut raw = RawMapping::new();
        raw.insert(
            RawEdgeKey::new(NodeRef::Composite(vec!["a".into(), "b".into()]), None),
            EdgeData::new().with_scalar("x", 1),
        );
        raw.insert(
            RawEdgeKey::new("a.b", None),
            EdgeData::new().with_scalar("y", 2),
        );
        let mapping = normalize_keys(raw).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&EdgeKey::node("a.b")].scalars.len(), 2);
    }

    #[test]
    fn colliding_labels_with_shared_attribute_fail() {
        let mut raw = RawMapping::new();
        raw.insert(
            RawEdgeKey::new(NodeRef::Composite(vec!["a".into(), "b".into()]), None),
            EdgeData::new().with_scalar("x", 1),
        );
        raw.insert(
            RawEdgeKey::new("a.b", None),
            EdgeData::new().with_scalar("x", 2),
        );
        assert_eq!(
            normalize_keys(raw).unwrap_err(),
            CoreError::KeyCollision {
                key: "a.b".into(),
                attribute: "x".into()
            }
        );
    }

    #[test]
    fn colliding_sequence_names_fail() {
        let mut raw = RawMapping::new();
        raw.insert(
            RawEdgeKey::new(
                NodeRef::Composite(vec!["r".into(), "gas".into()]),
                Some(NodeRef::Label("boiler".into())),
            ),
            EdgeData::new().with_sequence("flow", vec![1.0]),
        );
        raw.insert(
            RawEdgeKey::new("r.gas", Some(NodeRef::Label("boiler".into()))),
            EdgeData::new().with_sequence("flow", vec![2.0]),
        );
        let err = normalize_keys(raw).unwrap_err();
        assert!(matches!(err, CoreError::KeyCollision { ref key, .. } if key == "r.gas->boiler"));
    }

    #[test]
    fn edge_key_display() {
        assert_eq!(EdgeKey::new("A", "B").joined(), "A->B");
        assert_eq!(EdgeKey::node("A").joined(), "A");
    }
}
