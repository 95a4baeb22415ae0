//! Sample simulation data shared by the integration suites.

use simstore_core::{
    EdgeData, EdgeKey, EdgeMapping, NodeRef, RawEdgeKey, RawMapping, ScalarValue, Sequence,
    Series,
};
use simstore_engine::{Dataset, SimulationOutput};

/// `("A","B")` with an integer nominal value.
pub fn scenario_input() -> EdgeMapping {
    let mut mapping = EdgeMapping::new();
    mapping.insert(
        EdgeKey::new("A", "B"),
        EdgeData::new().with_scalar("nominal_value", 10),
    );
    mapping
}

/// `("A","B")` with a three-step flow list.
pub fn scenario_result() -> EdgeMapping {
    let mut mapping = EdgeMapping::new();
    mapping.insert(
        EdgeKey::new("A", "B"),
        EdgeData::new().with_sequence("flow", vec![1.0, 2.0, 3.0]),
    );
    mapping
}

/// A small dispatch model: gas source, boiler, heat bus, storage and demand.
pub fn dispatch_input() -> EdgeMapping {
    let mut mapping = EdgeMapping::new();
    mapping.insert(
        EdgeKey::new("gas", "boiler"),
        EdgeData::new()
            .with_scalar("variable_costs", 0.035)
            .with_scalar("carrier", "natural_gas")
            .with_scalar("nonconvex", false),
    );
    mapping.insert(
        EdgeKey::new("boiler", "heat"),
        EdgeData::new()
            .with_scalar("nominal_value", 250)
            .with_scalar("conversion_factor", 0.92)
            .with_sequence("max", vec![1.0, 1.0, 0.8, 0.8]),
    );
    mapping.insert(
        EdgeKey::new("heat", "demand"),
        EdgeData::new().with_sequence("fix", Series::new(vec![120.0, 180.5, 90.25, 60.0])),
    );
    mapping.insert(
        EdgeKey::node("storage"),
        EdgeData::new()
            .with_scalar("nominal_storage_capacity", 500)
            .with_scalar("balanced", true)
            .with_scalar("initial_storage_level", 0.5),
    );
    mapping
}

pub fn dispatch_result() -> EdgeMapping {
    let mut mapping = EdgeMapping::new();
    mapping.insert(
        EdgeKey::new("gas", "boiler"),
        EdgeData::new().with_sequence("flow", Series::new(vec![130.4, 196.2, 98.1, 65.2])),
    );
    mapping.insert(
        EdgeKey::new("boiler", "heat"),
        EdgeData::new()
            .with_sequence("flow", Series::new(vec![120.0, 180.5, 90.25, 60.0]))
            .with_scalar("invest", 0.0),
    );
    mapping.insert(
        EdgeKey::node("storage"),
        EdgeData::new()
            .with_sequence("storage_content", Series::new(vec![250.0, 250.0, 250.0, 250.0]))
            .with_sequence("losses", vec![0.0, 0.0, 0.0, 0.0]),
    );
    mapping
}

/// The dispatch model as an engine would report it, with structured node ids.
pub fn dispatch_output() -> SimulationOutput {
    SimulationOutput {
        input: structured(dispatch_input()),
        result: structured(dispatch_result()),
    }
}

/// Split `boiler` style labels into `["region_a", "boiler"]` composites.
fn structured(mapping: EdgeMapping) -> RawMapping {
    let node = |label: String| NodeRef::Composite(vec!["region_a".to_string(), label]);
    mapping
        .into_iter()
        .map(|(key, data)| {
            let raw = RawEdgeKey {
                from: node(key.from),
                to: key.to.map(node),
            };
            (raw, data)
        })
        .collect()
}

/// Prefix every label the way [`dispatch_output`] composites render.
pub fn prefixed(mapping: EdgeMapping) -> EdgeMapping {
    mapping
        .into_iter()
        .map(|(key, data)| {
            let key = EdgeKey {
                from: format!("region_a.{}", key.from),
                to: key.to.map(|to| format!("region_a.{to}")),
            };
            (key, data)
        })
        .collect()
}

/// Render `output` as a dataset file body.
pub fn dataset_json(output: &SimulationOutput) -> String {
    serde_json::to_string_pretty(&Dataset::from_output(output))
        .unwrap_or_else(|e| panic!("dataset fixture failed to serialize: {e}"))
}

/// Equal up to sequence index labels: same keys, same scalars, and
/// sequences with the same representation and values in the same order.
pub fn equivalent(expected: &EdgeMapping, actual: &EdgeMapping) -> bool {
    expected.len() == actual.len()
        && expected.iter().all(|(key, want)| {
            actual.get(key).is_some_and(|got| {
                want.scalars == got.scalars
                    && want.sequences.len() == got.sequences.len()
                    && want.sequences.iter().all(|(name, seq)| {
                        got.sequences
                            .get(name)
                            .is_some_and(|other: &Sequence| seq.same_values(other))
                    })
            })
        })
}

/// Every scalar type the codec supports, on one edge.
pub fn all_scalar_types() -> EdgeData {
    EdgeData::new()
        .with_scalar("s", ScalarValue::Str("with, comma and \"quotes\"".into()))
        .with_scalar("empty", ScalarValue::Str(String::new()))
        .with_scalar("f", ScalarValue::Float(-0.000123))
        .with_scalar("whole_float", ScalarValue::Float(3.0))
        .with_scalar("i", ScalarValue::Int(i64::MIN))
        .with_scalar("t", ScalarValue::Bool(true))
        .with_scalar("n", ScalarValue::Bool(false))
}
