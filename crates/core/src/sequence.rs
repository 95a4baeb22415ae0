//! Sequence normalization.
//!
//! Only values and their order are persisted. A series comes back with a
//! default positional index regardless of the labels it was written with.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// An ordered numeric series with an optional label index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<Vec<String>>,
    values: Vec<f64>,
}

impl Series {
    /// A series with the default positional index.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            index: None,
            values,
        }
    }

    pub fn with_index(index: Vec<String>, values: Vec<f64>) -> Result<Self, CoreError> {
        if index.len() != values.len() {
            return Err(CoreError::InvalidData(format!(
                "series index has {} labels for {} values",
                index.len(),
                values.len()
            )));
        }
        Ok(Self {
            index: Some(index),
            values,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn has_custom_index(&self) -> bool {
        self.index.is_some()
    }

    /// Index labels in order; positions when no custom index is set.
    pub fn labels(&self) -> Vec<String> {
        match &self.index {
            Some(index) => index.clone(),
            None => (0..self.values.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Deserialize)]
struct SeriesParts {
    #[serde(default)]
    index: Option<Vec<String>>,
    values: Vec<f64>,
}

impl TryFrom<SeriesParts> for Series {
    type Error = CoreError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        match parts.index {
            Some(index) => Series::with_index(index, parts.values),
            None => Ok(Series::new(parts.values)),
        }
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && values_eq(&self.values, &other.values)
    }
}

/// A time-series or list-valued attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sequence {
    List(Vec<f64>),
    Series(Series),
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => values_eq(a, b),
            (Self::Series(a), Self::Series(b)) => a == b,
            _ => false,
        }
    }
}

impl Sequence {
    pub fn values(&self) -> &[f64] {
        match self {
            Sequence::List(values) => values,
            Sequence::Series(series) => series.values(),
        }
    }

    pub fn representation(&self) -> RepresentationTag {
        match self {
            Sequence::List(_) => RepresentationTag::List,
            Sequence::Series(_) => RepresentationTag::Series,
        }
    }

    /// Same representation and same values in the same order; index labels ignored.
    pub fn same_values(&self, other: &Sequence) -> bool {
        self.representation() == other.representation() && values_eq(self.values(), other.values())
    }
}

impl From<Vec<f64>> for Sequence {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values)
    }
}

impl From<Series> for Sequence {
    fn from(series: Series) -> Self {
        Self::Series(series)
    }
}

fn values_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.total_cmp(y).is_eq())
}

/// Which shape a persisted sequence is rebuilt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationTag {
    List,
    Series,
}

impl RepresentationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "list" => Ok(Self::List),
            "series" => Ok(Self::Series),
            _ => Err(CoreError::UnknownRepresentationTag(s.to_string())),
        }
    }
}

impl fmt::Display for RepresentationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flatten a sequence into its stored values and representation tag.
pub fn normalize(sequence: &Sequence) -> (Vec<f64>, RepresentationTag) {
    match sequence {
        Sequence::List(values) => (values.clone(), RepresentationTag::List),
        Sequence::Series(series) => (series.values.clone(), RepresentationTag::Series),
    }
}

/// Rebuild a sequence from stored values and its textual representation tag.
pub fn denormalize(values: Vec<f64>, tag: &str) -> Result<Sequence, CoreError> {
    Ok(denormalize_tagged(values, RepresentationTag::parse(tag)?))
}

pub fn denormalize_tagged(values: Vec<f64>, tag: RepresentationTag) -> Sequence {
    match tag {
        RepresentationTag::List => Sequence::List(values),
        RepresentationTag::Series => Sequence::Series(Series::new(values)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_round_trip() {
        let seq = Sequence::List(vec![1.0, 2.0, 3.0]);
        let (values, tag) = normalize(&seq);
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(tag, RepresentationTag::List);
        assert_eq!(denormalize(values, tag.as_str()).unwrap(), seq);
    }

    #[test]
    fn series_drops_custom_index() {
        let series = Series::with_index(
            vec!["2020-01-01T00".into(), "2020-01-01T01".into()],
            vec![4.5, 0.0],
        )
        .unwrap();
        let seq = Sequence::Series(series);
        let (values, tag) = normalize(&seq);
        assert_eq!(tag, RepresentationTag::Series);

        let restored = denormalize(values, "series").unwrap();
        assert_ne!(restored, seq);
        assert!(restored.same_values(&seq));
        match restored {
            Sequence::Series(s) => {
                assert!(!s.has_custom_index());
                assert_eq!(s.labels(), vec!["0", "1"]);
            }
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_index_is_rejected() {
        let err = Series::with_index(vec!["a".into()], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidData(_)));
    }

    #[test]
    fn unknown_representation_is_rejected() {
        let err = denormalize(vec![1.0], "frame").unwrap_err();
        assert_eq!(err, CoreError::UnknownRepresentationTag("frame".into()));
    }

    #[test]
    fn same_values_respects_representation() {
        let list = Sequence::List(vec![1.0]);
        let series = Sequence::Series(Series::new(vec![1.0]));
        assert!(!list.same_values(&series));
    }
}
