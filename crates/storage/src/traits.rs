use simstore_core::{BundlePairId, DataBundleId, Role};

use crate::error::StorageError;

/// One scalar attribute row. `value` and `type_tag` hold the codec output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarRecord {
    pub from_node: String,
    pub to_node: Option<String>,
    pub attribute: String,
    pub value: String,
    pub type_tag: String,
}

/// One sequence attribute row. `repr_tag` says whether to rebuild a series or a list.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRecord {
    pub from_node: String,
    pub to_node: Option<String>,
    pub attribute: String,
    pub values: Vec<f64>,
    pub repr_tag: String,
}

/// Records of one role, ready to be inserted as a data bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBundleDraft {
    pub scalars: Vec<ScalarRecord>,
    pub sequences: Vec<SequenceRecord>,
}

impl DataBundleDraft {
    pub fn record_count(&self) -> usize {
        self.scalars.len() + self.sequences.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataBundleRecord {
    pub bundle_id: DataBundleId,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundlePairRecord {
    pub pair_id: BundlePairId,
    pub input_id: DataBundleId,
    pub result_id: DataBundleId,
    pub created_at_ms: i64,
}

impl BundlePairRecord {
    pub fn bundle_id(&self, role: Role) -> DataBundleId {
        match role {
            Role::Input => self.input_id,
            Role::Result => self.result_id,
        }
    }
}

/// Row totals across all tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub bundle_pairs: u64,
    pub data_bundles: u64,
    pub scalars: u64,
    pub sequences: u64,
}

pub trait Storage {
    /// Insert both bundles, all their records and the pair linking them in a
    /// single transaction. Nothing is visible unless everything is.
    fn insert_bundle_pair(
        &mut self,
        input: &DataBundleDraft,
        result: &DataBundleDraft,
    ) -> Result<BundlePairId, StorageError>;

    fn get_bundle_pair(
        &self,
        pair_id: BundlePairId,
    ) -> Result<Option<BundlePairRecord>, StorageError>;

    fn get_data_bundle(
        &self,
        bundle_id: DataBundleId,
    ) -> Result<Option<DataBundleRecord>, StorageError>;

    fn get_scalars(&self, bundle_id: DataBundleId) -> Result<Vec<ScalarRecord>, StorageError>;

    fn get_sequences(&self, bundle_id: DataBundleId)
    -> Result<Vec<SequenceRecord>, StorageError>;

    fn list_bundle_pairs(&self) -> Result<Vec<BundlePairRecord>, StorageError>;

    /// Delete a pair together with both of its bundles and their records.
    /// Returns false if the pair does not exist.
    fn delete_bundle_pair(&mut self, pair_id: BundlePairId) -> Result<bool, StorageError>;

    /// Delete one data bundle. Its records and the pair referencing it go with it.
    fn delete_data_bundle(&mut self, bundle_id: DataBundleId) -> Result<bool, StorageError>;

    fn record_counts(&self) -> Result<RecordCounts, StorageError>;
}
