use simstore_core::{BundlePairId, CoreError, EdgeData, EdgeKey, EdgeMapping, ScalarValue, Sequence};
use simstore_engine::{EngineError, ResultStore, StoreConfig};
use simstore_harness::{fixtures, TestStore};
use simstore_storage::{RecordCounts, Storage};

fn with_unencodable_value(mut mapping: EdgeMapping) -> EdgeMapping {
    mapping
        .entry(EdgeKey::new("boiler", "heat"))
        .or_default()
        .scalars
        .insert("opaque".into(), ScalarValue::Null);
    mapping
}

// ============================================================================
// Atomic writes
// ============================================================================

#[test]
fn unencodable_result_value_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let result = with_unencodable_value(fixtures::dispatch_result());

    let err = t
        .store
        .store(&fixtures::dispatch_input(), &result)
        .unwrap_err();
    assert!(err.is_codec());
    match err {
        EngineError::Core(CoreError::Codec {
            attribute,
            type_name,
        }) => {
            assert_eq!(attribute.as_deref(), Some("opaque"));
            assert_eq!(type_name, "null");
        }
        other => panic!("expected codec error, got {other:?}"),
    }

    // Neither the input bundle nor the pair exists.
    assert_eq!(t.store.storage().record_counts()?, RecordCounts::default());
    assert!(t.store.list()?.is_empty());
    Ok(())
}

#[test]
fn unencodable_input_value_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let input = with_unencodable_value(fixtures::dispatch_input());
    let err = t
        .store
        .store(&input, &fixtures::dispatch_result())
        .unwrap_err();
    assert!(err.is_codec());
    assert_eq!(t.store.storage().record_counts()?, RecordCounts::default());
    Ok(())
}

#[test]
fn failed_write_leaves_earlier_pairs_intact() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let kept = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    let before = t.store.storage().record_counts()?;

    let result = with_unencodable_value(fixtures::dispatch_result());
    assert!(t.store.store(&fixtures::dispatch_input(), &result).is_err());

    assert_eq!(t.store.storage().record_counts()?, before);
    let (input, _) = t.store.restore(kept)?;
    assert_eq!(input, fixtures::scenario_input());
    Ok(())
}

#[test]
fn record_counts_match_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    t.store
        .store(&fixtures::dispatch_input(), &fixtures::dispatch_result())?;
    let counts = t.store.storage().record_counts()?;
    assert_eq!(counts.bundle_pairs, 1);
    assert_eq!(counts.data_bundles, 2);
    // 3 + 2 + 3 input scalars, 1 result scalar.
    assert_eq!(counts.scalars, 9);
    // 1 + 1 input sequences, 1 + 1 + 2 result sequences.
    assert_eq!(counts.sequences, 6);
    Ok(())
}

// ============================================================================
// Deletion
// ============================================================================

#[test]
fn never_written_id_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestStore::new()?;
    let err = t.store.restore(BundlePairId::new(42)).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(id) if id.get() == 42));
    Ok(())
}

#[test]
fn deleting_a_pair_removes_every_record() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::dispatch_input(), &fixtures::dispatch_result())?;

    t.store.delete(pair_id)?;

    assert_eq!(t.store.storage().record_counts()?, RecordCounts::default());
    assert!(matches!(
        t.store.restore(pair_id),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        t.store.delete(pair_id),
        Err(EngineError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn deleted_pair_id_is_never_handed_out_again() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    t.store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    let deleted = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    t.store.delete(deleted)?;

    let next = t
        .store
        .store(&fixtures::dispatch_input(), &fixtures::dispatch_result())?;

    assert_ne!(next, deleted);
    assert!(matches!(
        t.store.restore(deleted),
        Err(EngineError::NotFound(id)) if id == deleted
    ));
    let (input, _) = t.store.restore(next)?;
    assert_eq!(input, fixtures::dispatch_input());
    Ok(())
}

#[test]
fn deleting_a_bundle_removes_its_pair()-> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    let pair = t.store.storage().get_bundle_pair(pair_id)?.unwrap();

    assert!(t.store.storage_mut().delete_data_bundle(pair.input_id)?);

    assert!(t.store.storage().get_bundle_pair(pair_id)?.is_none());
    assert!(t.store.storage().get_scalars(pair.input_id)?.is_empty());
    assert!(matches!(
        t.store.restore(pair_id),
        Err(EngineError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn deleting_one_pair_keeps_the_others() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let first = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    let second = t
        .store
        .store(&fixtures::dispatch_input(), &fixtures::dispatch_result())?;

    t.store.delete(first)?;

    let remaining: Vec<_> = t.store.list()?.into_iter().map(|p| p.pair_id).collect();
    assert_eq!(remaining, vec![second]);
    let (input, result) = t.store.restore(second)?;
    assert_eq!(input, fixtures::dispatch_input());
    assert_eq!(result, fixtures::dispatch_result());
    Ok(())
}

// ============================================================================
// Corrupt rows
// ============================================================================

#[test]
fn unknown_type_tag_fails_the_read() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    t.store.storage().conn().execute(
        "UPDATE scalar_records SET type_tag = 'complex' WHERE attribute = 'nominal_value'",
        [],
    )?;

    let err = t.store.restore(pair_id).unwrap_err();
    assert!(err.is_codec());
    assert!(matches!(
        err,
        EngineError::Core(CoreError::UnknownTypeTag(ref tag)) if tag == "complex"
    ));
    Ok(())
}

#[test]
fn unknown_representation_tag_fails_the_read() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    t.store
        .storage()
        .conn()
        .execute("UPDATE sequence_records SET repr_tag = 'matrix'", [])?;

    let err = t.store.restore(pair_id).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::UnknownRepresentationTag(ref tag)) if tag == "matrix"
    ));
    Ok(())
}

#[test]
fn malformed_integer_text_fails_the_read() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;
    t.store.storage().conn().execute(
        "UPDATE scalar_records SET value = 'ten' WHERE type_tag = 'int'",
        [],
    )?;

    let err = t.store.restore(pair_id).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::MalformedValue { tag: "int", ref value }) if value == "ten"
    ));
    Ok(())
}

// ============================================================================
// Bool decoding
// ============================================================================

fn flag_mapping(value: bool) -> EdgeMapping {
    let mut mapping = EdgeMapping::new();
    mapping.insert(
        EdgeKey::node("storage"),
        EdgeData::new().with_scalar("balanced", value),
    );
    mapping
}

#[test]
fn false_reads_back_false() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t.store.store(&flag_mapping(false), &EdgeMapping::new())?;
    let (input, _) = t.store.restore(pair_id)?;
    assert_eq!(input, flag_mapping(false));
    Ok(())
}

#[test]
fn legacy_decoding_reads_any_stored_bool_as_true() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t.store.store(&flag_mapping(false), &EdgeMapping::new())?;

    let legacy = ResultStore::open(StoreConfig {
        legacy_bool_decoding: true,
        ..t.store.config().clone()
    })?;
    let (input, _) = legacy.restore(pair_id)?;
    assert_eq!(input, flag_mapping(true));
    Ok(())
}

#[test]
fn legacy_decoding_reads_empty_text_as_false() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::with_config(|config| config.legacy_bool_decoding = true)?;
    let pair_id = t.store.store(&flag_mapping(true), &EdgeMapping::new())?;
    t.store.storage().conn().execute(
        "UPDATE scalar_records SET value = '' WHERE type_tag = 'bool'",
        [],
    )?;
    let (input, _) = t.store.restore(pair_id)?;
    assert_eq!(input, flag_mapping(false));
    Ok(())
}

// ============================================================================
// Persistence across connections
// ============================================================================

#[test]
fn results_survive_reopening() -> Result<(), Box<dyn std::error::Error>> {
    let mut t = TestStore::new()?;
    let pair_id = t
        .store
        .store(&fixtures::scenario_input(), &fixtures::scenario_result())?;

    let reopened = t.reopen()?;
    let (_, result) = reopened.restore(pair_id)?;
    assert_eq!(
        result[&EdgeKey::new("A", "B")].sequences["flow"],
        Sequence::List(vec![1.0, 2.0, 3.0])
    );
    assert_eq!(reopened.storage().schema_version()?, 1);
    Ok(())
}
