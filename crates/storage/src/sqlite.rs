use std::collections::BTreeMap;

use rusqlite::Connection;

use factmart_core::{RecordKey, Value};

use crate::error::StorageError;
use crate::traits::{DimensionCatalog, DimensionRow, FactRecord, FactStore};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
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

    fn load_fields(
        &self,
        record_type: &str,
        key_blob: &[u8],
    ) -> Result<BTreeMap<String, Value>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT field_key, value FROM fact_fields WHERE record_type = ?1 AND unique_id = ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![record_type, key_blob], |row| {
            let field_key: String = row.get(0)?;
            let value_bytes: Vec<u8> = row.get(1)?;
            Ok((field_key, value_bytes))
        })?;

        let mut fields = BTreeMap::new();
        for row in rows {
            let (field_key, value_bytes) = row?;
            let value = Value::from_msgpack(&value_bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            fields.insert(field_key, value);
        }
        Ok(fields)
    }
}

impl FactStore for SqliteStore {
    fn find(
        &self,
        record_type: &str,
        key: &RecordKey,
    ) -> Result<Option<FactRecord>, StorageError> {
        let key_blob = key.to_bytes()?;
        let mut stmt = self.conn.prepare(
            "SELECT is_dirty, is_frozen FROM facts WHERE record_type = ?1 AND unique_id = ?2",
        )?;
        let mut rows = stmt.query_map(rusqlite::params![record_type, &key_blob], |row| {
            let is_dirty: bool = row.get(0)?;
            let is_frozen: bool = row.get(1)?;
            Ok((is_dirty, is_frozen))
        })?;

        match rows.next() {
            Some(Ok((is_dirty, is_frozen))) => {
                let fields = self.load_fields(record_type, &key_blob)?;
                Ok(Some(FactRecord {
                    key: key.clone(),
                    is_dirty,
                    is_frozen,
                    persisted: true,
                    fields,
                }))
            }
            Some(Err(e)) => Err(StorageError::Sqlite(e)),
            None => Ok(None),
        }
    }

    fn upsert(
        &mut self,
        record_type: &str,
        key: &RecordKey,
        fields: &[(String, Value)],
        is_dirty: bool,
        is_frozen: bool,
    ) -> Result<(), StorageError> {
        let key_blob = key.to_bytes()?;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO facts (record_type, unique_id, is_dirty, is_frozen) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(record_type, unique_id) DO UPDATE SET
                 is_dirty = excluded.is_dirty,
                 is_frozen = excluded.is_frozen,
                 updated_at = CAST(unixepoch('now','subsec') * 1000 AS INTEGER)",
            rusqlite::params![record_type, &key_blob, is_dirty, is_frozen],
        )?;

        // Replace the field set wholesale: a recompute commits every declared
        // field together or none of them.
        tx.execute(
            "DELETE FROM fact_fields WHERE record_type = ?1 AND unique_id = ?2",
            rusqlite::params![record_type, &key_blob],
        )?;
        for (field_key, value) in fields {
            let value_bytes = value
                .to_msgpack()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            tx.execute(
                "INSERT INTO fact_fields (record_type, unique_id, field_key, value) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![record_type, &key_blob, field_key, value_bytes],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn mark_dirty(&mut self, record_type: &str, key: &RecordKey) -> Result<(), StorageError> {
        let key_blob = key.to_bytes()?;
        self.conn.execute(
            "UPDATE facts SET is_dirty = 1 WHERE record_type = ?1 AND unique_id = ?2 AND is_frozen = 0",
            rusqlite::params![record_type, &key_blob],
        )?;
        Ok(())
    }

    fn delete(&mut self, record_type: &str, key: &RecordKey) -> Result<(), StorageError> {
        let key_blob = key.to_bytes()?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM fact_fields WHERE record_type = ?1 AND unique_id = ?2",
            rusqlite::params![record_type, &key_blob],
        )?;
        tx.execute(
            "DELETE FROM facts WHERE record_type = ?1 AND unique_id = ?2",
            rusqlite::params![record_type, &key_blob],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count(&self, record_type: &str) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE record_type = ?1",
            rusqlite::params![record_type],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl DimensionCatalog for SqliteStore {
    fn find_dimension(
        &self,
        dimension: &str,
        key: &RecordKey,
    ) -> Result<Option<DimensionRow>, StorageError> {
        Ok(self.find(dimension, key)?.map(|record| DimensionRow {
            key: record.key,
            attributes: record.fields,
        }))
    }

    fn seed_dimension(
        &mut self,
        dimension: &str,
        key: &RecordKey,
        attributes: &[(String, Value)],
    ) -> Result<bool, StorageError> {
        let key_blob = key.to_bytes()?;
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO facts (record_type, unique_id, is_dirty, is_frozen) VALUES (?1, ?2, 0, 0)",
            rusqlite::params![dimension, &key_blob],
        )?;
        if inserted == 0 {
            // Natural key already seeded; leave the existing row untouched.
            return Ok(false);
        }

        for (field_key, value) in attributes {
            let value_bytes = value
                .to_msgpack()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            tx.execute(
                "INSERT INTO fact_fields (record_type, unique_id, field_key, value) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![dimension, &key_blob, field_key, value_bytes],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }
}
