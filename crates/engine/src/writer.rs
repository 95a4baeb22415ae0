//! Persistence writer: nested mappings in, one bundle pair id out.

use tracing::{debug, info};

use simstore_core::{
    codec, mapping, sequence, BundlePairId, CoreError, EdgeMapping, RawMapping, Role,
};
use simstore_storage::{DataBundleDraft, ScalarRecord, SequenceRecord, Storage};

use crate::error::EngineError;

/// Encode every attribute of one role into records.
///
/// Fails on the first value the codec cannot encode; no attribute is dropped.
pub fn build_draft(mapping: &EdgeMapping) -> Result<DataBundleDraft, CoreError> {
    let mut draft = DataBundleDraft::default();
    for (key, data) in mapping {
        for (name, value) in &data.scalars {
            let (value, tag) = codec::encode(value).map_err(|e| e.for_attribute(name))?;
            draft.scalars.push(ScalarRecord {
                from_node: key.from.clone(),
                to_node: key.to.clone(),
                attribute: name.clone(),
                value,
                type_tag: tag.as_str().to_string(),
            });
        }
        for (name, series) in &data.sequences {
            let (values, tag) = sequence::normalize(series);
            draft.sequences.push(SequenceRecord {
                from_node: key.from.clone(),
                to_node: key.to.clone(),
                attribute: name.clone(),
                values,
                repr_tag: tag.as_str().to_string(),
            });
        }
    }
    Ok(draft)
}

/// Persist an input and a result mapping under a new bundle pair.
///
/// Both roles are fully encoded before storage is touched, and the storage
/// insert is a single transaction.
pub fn store_results<S: Storage>(
    storage: &mut S,
    input: &EdgeMapping,
    result: &EdgeMapping,
) -> Result<BundlePairId, EngineError> {
    let input_draft = build_draft(input)?;
    let result_draft = build_draft(result)?;
    debug!(
        role = %Role::Input,
        scalars = input_draft.scalars.len(),
        sequences = input_draft.sequences.len(),
        "encoded bundle"
    );
    debug!(
        role = %Role::Result,
        scalars = result_draft.scalars.len(),
        sequences = result_draft.sequences.len(),
        "encoded bundle"
    );

    let pair_id = storage.insert_bundle_pair(&input_draft, &result_draft)?;
    info!(
        pair_id = %pair_id,
        records = input_draft.record_count() + result_draft.record_count(),
        "stored results"
    );
    Ok(pair_id)
}

/// Like [`store_results`], for engine output whose keys may still hold
/// structured node identifiers. Keys that collapse onto the same label and
/// share an attribute name fail the write before storage is touched.
pub fn store_raw_results<S: Storage>(
    storage: &mut S,
    input: RawMapping,
    result: RawMapping,
) -> Result<BundlePairId, EngineError> {
    let input = normalize_if_needed(input)?;
    let result = normalize_if_needed(result)?;
    store_results(storage, &input, &result)
}

/// Remove a stored pair together with both of its bundles and their records.
pub fn delete_results<S: Storage>(storage: &mut S, pair_id: BundlePairId) -> Result<(), EngineError> {
    if !storage.delete_bundle_pair(pair_id)? {
        return Err(EngineError::NotFound(pair_id));
    }
    info!(pair_id = %pair_id, "deleted results");
    Ok(())
}

fn normalize_if_needed(raw: RawMapping) -> Result<EdgeMapping, CoreError> {
    if !mapping::is_normalized(&raw) {
        debug!(keys = raw.len(), "normalizing structured node keys");
    }
    mapping::normalize_keys(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simstore_core::{EdgeData, EdgeKey, NodeRef, RawEdgeKey, ScalarValue, Series};
    use simstore_storage::{RecordCounts, SqliteStorage};

    #[test]
    fn draft_tags_every_attribute_with_its_edge() {
        let mut mapping = EdgeMapping::new();
        mapping.insert(
            EdgeKey::new("A", "B"),
            EdgeData::new()
                .with_scalar("nominal_value", 10)
                .with_scalar("fixed", false)
                .with_sequence("flow", Series::new(vec![1.0, 2.0])),
        );
        mapping.insert(
            EdgeKey::node("C"),
            EdgeData::new().with_sequence("level", vec![0.5]),
        );

        let draft = build_draft(&mapping).unwrap();
        assert_eq!(draft.scalars.len(), 2);
        assert_eq!(draft.sequences.len(), 2);

        let fixed = draft.scalars.iter().find(|s| s.attribute == "fixed").unwrap();
        assert_eq!(fixed.from_node, "A");
        assert_eq!(fixed.to_node.as_deref(), Some("B"));
        assert_eq!(fixed.value, "False");
        assert_eq!(fixed.type_tag, "bool");

        let flow = draft.sequences.iter().find(|s| s.attribute == "flow").unwrap();
        assert_eq!(flow.repr_tag, "series");
        let level = draft.sequences.iter().find(|s| s.attribute == "level").unwrap();
        assert_eq!(level.to_node, None);
        assert_eq!(level.repr_tag, "list");
    }

    #[test]
    fn unencodable_scalar_names_the_attribute() {
        let mut mapping = EdgeMapping::new();
        mapping.insert(
            EdgeKey::new("A", "B"),
            EdgeData::new().with_scalar("capacity", ScalarValue::Null),
        );
        let err = build_draft(&mapping).unwrap_err();
        assert_eq!(
            err,
            CoreError::Codec {
                attribute: Some("capacity".into()),
                type_name: "null"
            }
        );
    }

    #[test]
    fn failed_encoding_never_reaches_storage() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut input = EdgeMapping::new();
        input.insert(EdgeKey::new("A", "B"), EdgeData::new().with_scalar("x", 1));
        let mut result = EdgeMapping::new();
        result.insert(
            EdgeKey::new("A", "B"),
            EdgeData::new().with_scalar("y", ScalarValue::Null),
        );

        let err = store_results(&mut storage, &input, &result).unwrap_err();
        assert!(err.is_codec());
        assert_eq!(storage.record_counts().unwrap(), RecordCounts::default());
    }

    #[test]
    fn key_collision_never_reaches_storage() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut input = RawMapping::new();
        input.insert(
            RawEdgeKey::new(NodeRef::Composite(vec!["a".into(), "b".into()]), None),
            EdgeData::new().with_scalar("x", 1),
        );
        input.insert(RawEdgeKey::new("a.b", None), EdgeData::new().with_scalar("x", 2));

        let err = store_raw_results(&mut storage, input, RawMapping::new()).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::KeyCollision { .. })));
        assert_eq!(storage.record_counts().unwrap(), RecordCounts::default());
    }

    #[test]
    fn delete_missing_pair_is_not_found() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let err = delete_results(&mut storage, BundlePairId::new(3)).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(id) if id.get() == 3));
    }
}
