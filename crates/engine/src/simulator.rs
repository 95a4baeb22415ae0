//! Simulation engine boundary.
//!
//! The engine itself is a black box: it takes a dataset path and hands back
//! nested input and result mappings, possibly keyed by structured node ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use simstore_core::{EdgeData, NodeRef, RawEdgeKey, RawMapping, ScalarValue, Sequence};

/// Opaque failure reported by a simulation engine.
#[derive(Debug, Clone, Error)]
#[error("simulation failed for {}: {reason}", .dataset.display())]
pub struct SimulationError {
    pub dataset: PathBuf,
    pub reason: String,
}

impl SimulationError {
    pub fn new(dataset: &Path, reason: impl Into<String>) -> Self {
        Self {
            dataset: dataset.to_path_buf(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOutput {
    pub input: RawMapping,
    pub result: RawMapping,
}

pub trait Simulator: Send + Sync {
    fn simulate(&self, dataset: &Path) -> Result<SimulationOutput, SimulationError>;
}

/// One edge of a dataset file. JSON objects cannot be keyed by pairs, so
/// datasets list edges explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub from: NodeRef,
    #[serde(default)]
    pub to: Option<NodeRef>,
    #[serde(default)]
    pub scalars: BTreeMap<String, ScalarValue>,
    #[serde(default)]
    pub sequences: BTreeMap<String, Sequence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub input: Vec<EdgeEntry>,
    #[serde(default)]
    pub result: Vec<EdgeEntry>,
}

impl Dataset {
    pub fn from_output(output: &SimulationOutput) -> Self {
        let entries = |mapping: &RawMapping| -> Vec<EdgeEntry> {
            mapping
                .iter()
                .map(|(key, data)| EdgeEntry {
                    from: key.from.clone(),
                    to: key.to.clone(),
                    scalars: data.scalars.clone(),
                    sequences: data.sequences.clone(),
                })
                .collect()
        };
        Self {
            input: entries(&output.input),
            result: entries(&output.result),
        }
    }

    /// Collect entries into mappings. A key listed twice is an error rather
    /// than a silent merge.
    pub fn into_output(self) -> Result<SimulationOutput, String> {
        Ok(SimulationOutput {
            input: collect_entries(self.input, "input")?,
            result: collect_entries(self.result, "result")?,
        })
    }
}

fn collect_entries(entries: Vec<EdgeEntry>, section: &str) -> Result<RawMapping, String> {
    let mut mapping = RawMapping::new();
    for entry in entries {
        let key = RawEdgeKey {
            from: entry.from,
            to: entry.to,
        };
        if mapping.contains_key(&key) {
            return Err(format!("duplicate {section} edge {key:?}"));
        }
        mapping.insert(
            key,
            EdgeData {
                scalars: entry.scalars,
                sequences: entry.sequences,
            },
        );
    }
    Ok(mapping)
}

/// Engine adapter that reads pre-computed runs from JSON dataset files.
#[derive(Debug, Clone, Default)]
pub struct JsonDatasetSimulator;

impl Simulator for JsonDatasetSimulator {
    fn simulate(&self, dataset: &Path) -> Result<SimulationOutput, SimulationError> {
        let content =
            std::fs::read_to_string(dataset).map_err(|e| SimulationError::new(dataset, e.to_string()))?;
        let parsed: Dataset =
            serde_json::from_str(&content).map_err(|e| SimulationError::new(dataset, e.to_string()))?;
        parsed
            .into_output()
            .map_err(|reason| SimulationError::new(dataset, reason))
    }
}
