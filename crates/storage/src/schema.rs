use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32, StorageError> {
    let version: i32 =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version)
}

// Deleting a data bundle removes its records and the pair that owns it, so a
// pair can never be observed with only one side. Ids are never reused after a
// delete.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS data_bundles (
    bundle_id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL CHECK (role IN ('input', 'result')),
    created_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER))
);

CREATE TABLE IF NOT EXISTS bundle_pairs (
    pair_id INTEGER PRIMARY KEY AUTOINCREMENT,
    input_id INTEGER NOT NULL UNIQUE REFERENCES data_bundles (bundle_id) ON DELETE CASCADE,
    result_id INTEGER NOT NULL UNIQUE REFERENCES data_bundles (bundle_id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER)),
    CHECK (input_id <> result_id)
);

CREATE TABLE IF NOT EXISTS scalar_records (
    scalar_id INTEGER PRIMARY KEY AUTOINCREMENT,
    bundle_id INTEGER NOT NULL REFERENCES data_bundles (bundle_id) ON DELETE CASCADE,
    from_node TEXT NOT NULL,
    to_node TEXT,
    attribute TEXT NOT NULL,
    value TEXT NOT NULL,
    type_tag TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scalar_records_bundle ON scalar_records (bundle_id);

CREATE TABLE IF NOT EXISTS sequence_records (
    sequence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    bundle_id INTEGER NOT NULL REFERENCES data_bundles (bundle_id) ON DELETE CASCADE,
    from_node TEXT NOT NULL,
    to_node TEXT,
    attribute TEXT NOT NULL,
    value BLOB NOT NULL,
    repr_tag TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sequence_records_bundle ON sequence_records (bundle_id);
";
