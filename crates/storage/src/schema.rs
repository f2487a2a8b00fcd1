use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS facts (
    record_type TEXT NOT NULL,
    unique_id BLOB NOT NULL,
    is_dirty INTEGER NOT NULL DEFAULT 0,
    is_frozen INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER)),
    PRIMARY KEY (record_type, unique_id)
);
CREATE INDEX IF NOT EXISTS idx_facts_dirty ON facts (record_type) WHERE is_dirty = 1;

CREATE TABLE IF NOT EXISTS fact_fields (
    record_type TEXT NOT NULL,
    unique_id BLOB NOT NULL,
    field_key TEXT NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (record_type, unique_id, field_key)
);
";
