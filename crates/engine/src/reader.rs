//! Persistence reader: rebuild the nested mappings stored under a bundle pair.

use tracing::{debug, info, warn};

use simstore_core::{
    codec, sequence, BoolDecoding, BundlePairId, CoreError, DataBundleId, EdgeKey, EdgeMapping,
    Role,
};
use simstore_storage::{ScalarRecord, SequenceRecord, Storage};

use crate::error::EngineError;

/// Group records by edge and decode them.
///
/// Every edge that appears in either record kind gets an entry, with an
/// empty map for the kind it has none of. Any decode failure aborts the
/// whole rebuild.
pub fn rebuild(
    scalars: Vec<ScalarRecord>,
    sequences: Vec<SequenceRecord>,
    bools: BoolDecoding,
) -> Result<EdgeMapping, CoreError> {
    let mut mapping = EdgeMapping::new();
    for record in scalars {
        let value = codec::decode(&record.value, &record.type_tag, bools)?;
        let key = EdgeKey {
            from: record.from_node,
            to: record.to_node,
        };
        mapping
            .entry(key)
            .or_default()
            .scalars
            .insert(record.attribute, value);
    }
    for record in sequences {
        let series = sequence::denormalize(record.values, &record.repr_tag)?;
        let key = EdgeKey {
            from: record.from_node,
            to: record.to_node,
        };
        mapping
            .entry(key)
            .or_default()
            .sequences
            .insert(record.attribute, series);
    }
    Ok(mapping)
}

/// Load and decode one role of a stored pair.
fn restore_role<S: Storage>(
    storage: &S,
    pair_id: BundlePairId,
    role: Role,
    bundle_id: DataBundleId,
    bools: BoolDecoding,
) -> Result<EdgeMapping, EngineError> {
    let scalars = storage.get_scalars(bundle_id)?;
    let sequences = storage.get_sequences(bundle_id)?;
    debug!(
        pair_id = %pair_id,
        role = %role,
        scalars = scalars.len(),
        sequences = sequences.len(),
        "loaded bundle"
    );
    Ok(rebuild(scalars, sequences, bools)?)
}

/// Rebuild the input and result mappings stored under `pair_id`.
pub fn restore_results<S: Storage>(
    storage: &S,
    pair_id: BundlePairId,
    bools: BoolDecoding,
) -> Result<(EdgeMapping, EdgeMapping), EngineError> {
    let pair = storage
        .get_bundle_pair(pair_id)?
        .ok_or(EngineError::NotFound(pair_id))?;
    if bools == BoolDecoding::Truthy {
        warn!(pair_id = %pair_id, "decoding bools by string truthiness");
    }

    let input = restore_role(storage, pair_id, Role::Input, pair.input_id, bools)?;
    let result = restore_role(storage, pair_id, Role::Result, pair.result_id, bools)?;
    info!(
        pair_id = %pair_id,
        input_edges = input.len(),
        result_edges = result.len(),
        "restored results"
    );
    Ok((input, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simstore_core::{ScalarValue, Sequence};

    fn scalar(from: &str, to: Option<&str>, attribute: &str, value: &str, tag: &str) -> ScalarRecord {
        ScalarRecord {
            from_node: from.into(),
            to_node: to.map(Into::into),
            attribute: attribute.into(),
            value: value.into(),
            type_tag: tag.into(),
        }
    }

    fn sequence(from: &str, to: Option<&str>, attribute: &str, tag: &str) -> SequenceRecord {
        SequenceRecord {
            from_node: from.into(),
            to_node: to.map(Into::into),
            attribute: attribute.into(),
            values: vec![1.0, 2.0, 3.0],
            repr_tag: tag.into(),
        }
    }

    #[test]
    fn keys_with_one_kind_get_empty_other_half() {
        let mapping = rebuild(
            vec![scalar("A", Some("B"), "nominal_value", "10", "int")],
            vec![sequence("B", None, "flow", "list")],
            BoolDecoding::Strict,
        )
        .unwrap();

        let ab = &mapping[&EdgeKey::new("A", "B")];
        assert_eq!(ab.scalars["nominal_value"], ScalarValue::Int(10));
        assert!(ab.sequences.is_empty());

        let b = &mapping[&EdgeKey::node("B")];
        assert!(b.scalars.is_empty());
        assert_eq!(b.sequences["flow"], Sequence::List(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn attributes_group_under_shared_key() {
        let mapping = rebuild(
            vec![
                scalar("A", Some("B"), "x", "1.5", "float"),
                scalar("A", Some("B"), "name", "pipe", "str"),
            ],
            vec![sequence("A", Some("B"), "flow", "series")],
            BoolDecoding::Strict,
        )
        .unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&EdgeKey::new("A", "B")].attribute_count(), 3);
    }

    #[test]
    fn one_bad_tag_fails_the_whole_rebuild() {
        let err = rebuild(
            vec![
                scalar("A", Some("B"), "x", "1", "int"),
                scalar("A", Some("B"), "y", "1", "decimal"),
            ],
            vec![],
            BoolDecoding::Strict,
        )
        .unwrap_err();
        assert_eq!(err, CoreError::UnknownTypeTag("decimal".into()));
    }

    #[test]
    fn bad_representation_fails() {
        let err = rebuild(vec![], vec![sequence("A", None, "flow", "frame")], BoolDecoding::Strict)
            .unwrap_err();
        assert_eq!(err, CoreError::UnknownRepresentationTag("frame".into()));
    }
}
