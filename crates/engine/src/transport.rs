//! JSON-ready shape of a restored mapping.
//!
//! Edge keys collapse to their joined text and every sequence becomes an
//! ordered `{index: value}` object.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use simstore_core::{EdgeMapping, ScalarValue, Sequence};

use crate::error::EngineError;

/// A sequence as ordered (index, value) entries.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedValues(Vec<(String, f64)>);

impl IndexedValues {
    pub fn entries(&self) -> &[(String, f64)] {
        &self.0
    }
}

impl From<&Sequence> for IndexedValues {
    fn from(sequence: &Sequence) -> Self {
        let entries = match sequence {
            Sequence::Series(series) => series
                .labels()
                .into_iter()
                .zip(series.values().iter().copied())
                .collect(),
            Sequence::List(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), *v))
                .collect(),
        };
        Self(entries)
    }
}

// Entry order must survive serialization, so this is written as a map by hand.
impl Serialize for IndexedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, value) in &self.0 {
            map.serialize_entry(index, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportEdge {
    pub scalars: BTreeMap<String, ScalarValue>,
    pub sequences: BTreeMap<String, IndexedValues>,
}

pub type TransportResults = BTreeMap<String, TransportEdge>;

/// Render `mapping` for JSON transport.
///
/// A node label can itself contain `->`, so two distinct keys may render to
/// the same text. That fails with `TransportKeyCollision` instead of letting
/// one edge replace the other.
pub fn to_transport(mapping: &EdgeMapping) -> Result<TransportResults, EngineError> {
    let mut results = TransportResults::new();
    for (key, data) in mapping {
        let edge = TransportEdge {
            scalars: data.scalars.clone(),
            sequences: data
                .sequences
                .iter()
                .map(|(name, sequence)| (name.clone(), IndexedValues::from(sequence)))
                .collect(),
        };
        match results.entry(key.joined()) {
            Entry::Vacant(slot) => {
                slot.insert(edge);
            }
            Entry::Occupied(slot) => {
                return Err(EngineError::TransportKeyCollision(slot.key().clone()));
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simstore_core::{EdgeData, EdgeKey, Series};

    #[test]
    fn json_shape() {
        let mut mapping = EdgeMapping::new();
        mapping.insert(
            EdgeKey::new("A", "B"),
            EdgeData::new()
                .with_scalar("nominal_value", 10)
                .with_sequence("flow", Series::new(vec![1.0, 2.0])),
        );
        mapping.insert(EdgeKey::node("C"), EdgeData::new().with_scalar("label", "tank"));

        let json = serde_json::to_value(to_transport(&mapping).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "A->B": {
                    "scalars": {"nominal_value": 10},
                    "sequences": {"flow": {"0": 1.0, "1": 2.0}}
                },
                "C": {"scalars": {"label": "tank"}, "sequences": {}}
            })
        );
    }

    #[test]
    fn series_labels_keep_their_order() {
        let series = Series::with_index(
            vec!["t10".into(), "t2".into(), "t1".into()],
            vec![3.0, 2.0, 1.0],
        )
        .unwrap();
        let indexed = IndexedValues::from(&Sequence::Series(series));
        let text = serde_json::to_string(&indexed).unwrap();
        assert_eq!(text, r#"{"t10":3.0,"t2":2.0,"t1":1.0}"#);
    }

    #[test]
    fn keys_rendering_alike_are_rejected() {
        let mut mapping = EdgeMapping::new();
        mapping.insert(EdgeKey::new("A", "B"), EdgeData::new().with_scalar("x", 1));
        mapping.insert(EdgeKey::node("A->B"), EdgeData::new().with_scalar("y", 2));

        let err = to_transport(&mapping).unwrap_err();
        assert!(matches!(err, EngineError::TransportKeyCollision(ref key) if key == "A->B"));
    }

    #[test]
    fn lists_use_positions() {
        let indexed = IndexedValues::from(&Sequence::List(vec![0.5; 12]));
        assert_eq!(indexed.entries()[11].0, "11");
    }
}
