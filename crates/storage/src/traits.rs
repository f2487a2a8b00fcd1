use std::collections::BTreeMap;

use factmart_core::{RecordKey, Value};

use crate::error::StorageError;

/// One materialized fact (or dimension) row. `persisted` distinguishes a row
/// fetched from the store from a fresh, never-saved record; a new record is
/// conceptually dirty and has no committed fields until its first successful
/// update.
#[derive(Debug, Clone)]
pub struct FactRecord {
    pub key: RecordKey,
    pub is_dirty: bool,
    pub is_frozen: bool,
    pub persisted: bool,
    pub fields: BTreeMap<String, Value>,
}

impl FactRecord {
    /// A fresh, unsaved, dirty record carrying only its identifier.
    pub fn new_unsaved(key: RecordKey) -> Self {
        Self {
            key,
            is_dirty: true,
            is_frozen: false,
            persisted: false,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A dimension row looked up by natural key.
#[derive(Debug, Clone)]
pub struct DimensionRow {
    pub key: RecordKey,
    pub attributes: BTreeMap<String, Value>,
}

/// Get/create/update/delete on materialized rows, keyed by
/// `(record type, unique identifier)`. Single-row operations are atomic; an
/// `upsert` commits the full field set together or not at all.
pub trait FactStore {
    fn find(&self, record_type: &str, key: &RecordKey)
    -> Result<Option<FactRecord>, StorageError>;

    /// Create or replace the row and its entire field set in one transaction.
    fn upsert(
        &mut self,
        record_type: &str,
        key: &RecordKey,
        fields: &[(String, Value)],
        is_dirty: bool,
        is_frozen: bool,
    ) -> Result<(), StorageError>;

    /// Set the dirty flag without reading or touching any other column.
    /// Silently a no-op when no row exists yet or the row is frozen.
    fn mark_dirty(&mut self, record_type: &str, key: &RecordKey) -> Result<(), StorageError>;

    fn delete(&mut self, record_type: &str, key: &RecordKey) -> Result<(), StorageError>;

    fn count(&self, record_type: &str) -> Result<u64, StorageError>;
}

/// Lookup and idempotent seeding of dimension rows. Dimension rows share the
/// fact row space: they are materialized records whose natural key is the
/// unique identifier.
pub trait DimensionCatalog {
    fn find_dimension(
        &self,
        dimension: &str,
        key: &RecordKey,
    ) -> Result<Option<DimensionRow>, StorageError>;

    /// Insert a pre-computed dimension row. Duplicate natural keys are
    /// silently ignored; returns whether a row was actually inserted.
    fn seed_dimension(
        &mut self,
        dimension: &str,
        key: &RecordKey,
        attributes: &[(String, Value)],
    ) -> Result<bool, StorageError>;
}
