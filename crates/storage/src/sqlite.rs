use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use simstore_core::{BundlePairId, DataBundleId, Role};

use crate::error::StorageError;
use crate::traits::{
    BundlePairRecord, DataBundleDraft, DataBundleRecord, RecordCounts, ScalarRecord,
    SequenceRecord, Storage,
};

fn encode_values(values: &[f64]) -> Result<Vec<u8>, StorageError> {
    rmp_serde::to_vec(&values).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_values(bytes: &[u8]) -> Result<Vec<f64>, StorageError> {
    rmp_serde::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i32, StorageError> {
        crate::schema::schema_version(&self.conn)
    }
}

fn insert_data_bundle(
    tx: &Transaction,
    role: Role,
    draft: &DataBundleDraft,
) -> Result<DataBundleId, StorageError> {
    tx.execute(
        "INSERT INTO data_bundles (role) VALUES (?1)",
        rusqlite::params![role.as_str()],
    )?;
    let bundle_id = DataBundleId::new(tx.last_insert_rowid());

    let mut stmt = tx.prepare_cached(
        "INSERT INTO scalar_records (bundle_id, from_node, to_node, attribute, value, type_tag) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for scalar in &draft.scalars {
        stmt.execute(rusqlite::params![
            bundle_id.get(),
            scalar.from_node,
            scalar.to_node,
            scalar.attribute,
            scalar.value,
            scalar.type_tag,
        ])?;
    }

    let mut stmt = tx.prepare_cached(
        "INSERT INTO sequence_records (bundle_id, from_node, to_node, attribute, value, repr_tag) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for sequence in &draft.sequences {
        stmt.execute(rusqlite::params![
            bundle_id.get(),
            sequence.from_node,
            sequence.to_node,
            sequence.attribute,
            encode_values(&sequence.values)?,
            sequence.repr_tag,
        ])?;
    }

    Ok(bundle_id)
}

fn read_pair(row: &rusqlite::Row) -> rusqlite::Result<BundlePairRecord> {
    Ok(BundlePairRecord {
        pair_id: BundlePairId::new(row.get(0)?),
        input_id: DataBundleId::new(row.get(1)?),
        result_id: DataBundleId::new(row.get(2)?),
        created_at_ms: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    fn insert_bundle_pair(
        &mut self,
        input: &DataBundleDraft,
        result: &DataBundleDraft,
    ) -> Result<BundlePairId, StorageError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let input_id = insert_data_bundle(&tx, Role::Input, input)?;
        let result_id = insert_data_bundle(&tx, Role::Result, result)?;

        let inserted = tx.execute(
            "INSERT INTO bundle_pairs (input_id, result_id) VALUES (?1, ?2)",
            rusqlite::params![input_id.get(), result_id.get()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, msg))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StorageError::ConstraintViolation(
                    msg.unwrap_or_else(|| "bundle pair constraint".to_string()),
                ));
            }
            Err(e) => return Err(StorageError::Sqlite(e)),
        }
        let pair_id = BundlePairId::new(tx.last_insert_rowid());

        tx.commit()?;
        Ok(pair_id)
    }

    fn get_bundle_pair(
        &self,
        pair_id: BundlePairId,
    ) -> Result<Option<BundlePairRecord>, StorageError> {
        let record = self
            .conn
            .query_row(
                "SELECT pair_id, input_id, result_id, created_at FROM bundle_pairs WHERE pair_id = ?1",
                rusqlite::params![pair_id.get()],
                read_pair,
            )
            .optional()?;
        Ok(record)
    }

    fn get_data_bundle(
        &self,
        bundle_id: DataBundleId,
    ) -> Result<Option<DataBundleRecord>, StorageError> {
        let role: Option<String> = self
            .conn
            .query_row(
                "SELECT role FROM data_bundles WHERE bundle_id = ?1",
                rusqlite::params![bundle_id.get()],
                |row| row.get(0),
            )
            .optional()?;
        match role {
            Some(role) => Ok(Some(DataBundleRecord {
                bundle_id,
                role: Role::parse(&role)?,
            })),
            None => Ok(None),
        }
    }

    fn get_scalars(&self, bundle_id: DataBundleId) -> Result<Vec<ScalarRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT from_node, to_node, attribute, value, type_tag FROM scalar_records WHERE bundle_id = ?1 ORDER BY scalar_id",
        )?;
        let scalars = stmt
            .query_map(rusqlite::params![bundle_id.get()], |row| {
                Ok(ScalarRecord {
                    from_node: row.get(0)?,
                    to_node: row.get(1)?,
                    attribute: row.get(2)?,
                    value: row.get(3)?,
                    type_tag: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scalars)
    }

    fn get_sequences(
        &self,
        bundle_id: DataBundleId,
    ) -> Result<Vec<SequenceRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT from_node, to_node, attribute, value, repr_tag FROM sequence_records WHERE bundle_id = ?1 ORDER BY sequence_id",
        )?;
        let rows = stmt.query_map(rusqlite::params![bundle_id.get()], |row| {
            let from_node: String = row.get(0)?;
            let to_node: Option<String> = row.get(1)?;
            let attribute: String = row.get(2)?;
            let value_bytes: Vec<u8> = row.get(3)?;
            let repr_tag: String = row.get(4)?;
            Ok((from_node, to_node, attribute, value_bytes, repr_tag))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (from_node, to_node, attribute, value_bytes, repr_tag) = row?;
            result.push(SequenceRecord {
                from_node,
                to_node,
                attribute,
                values: decode_values(&value_bytes)?,
                repr_tag,
            });
        }
        Ok(result)
    }

    fn list_bundle_pairs(&self) -> Result<Vec<BundlePairRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT pair_id, input_id, result_id, created_at FROM bundle_pairs ORDER BY pair_id",
        )?;
        let pairs = stmt
            .query_map([], read_pair)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }

    fn delete_bundle_pair(&mut self, pair_id: BundlePairId) -> Result<bool, StorageError> {
        let tx = self.conn.transaction()?;
        let pair = tx
            .query_row(
                "SELECT pair_id, input_id, result_id, created_at FROM bundle_pairs WHERE pair_id = ?1",
                rusqlite::params![pair_id.get()],
                read_pair,
            )
            .optional()?;
        let Some(pair) = pair else {
            return Ok(false);
        };

        tx.execute(
            "DELETE FROM data_bundles WHERE bundle_id IN (?1, ?2)",
            rusqlite::params![pair.input_id.get(), pair.result_id.get()],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_data_bundle(&mut self, bundle_id: DataBundleId) -> Result<bool, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM data_bundles WHERE bundle_id = ?1",
            rusqlite::params![bundle_id.get()],
        )?;
        Ok(deleted > 0)
    }

    fn record_counts(&self) -> Result<RecordCounts, StorageError> {
        let count = |table: &str| -> Result<u64, StorageError> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as u64)
        };
        Ok(RecordCounts {
            bundle_pairs: count("bundle_pairs")?,
            data_bundles: count("data_bundles")?,
            scalars: count("scalar_records")?,
            sequences: count("sequence_records")?,
        })
    }
}
