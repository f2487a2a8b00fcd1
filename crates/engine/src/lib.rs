pub mod error;
pub mod resolve;
pub mod seed;

pub use error::EngineError;
pub use seed::{init_date_dimension, init_hour_dimension};

use std::collections::BTreeMap;

use time::{Date, UtcOffset};
use tracing::debug;

use factmart_core::resolve::resolve_raw;
use factmart_core::{FieldKind, RecordKey, SchemaDescriptor, SourceRecord};
use factmart_storage::{FactRecord, FactStore, SqliteStore, StorageError};

use crate::resolve::resolve_dimension_key;

/// Record type name of the pre-seeded calendar date dimension.
pub const DATE_DIMENSION: &str = "date_dimension";
/// Record type name of the pre-seeded hour-of-day dimension.
pub const HOUR_DIMENSION: &str = "hour_dimension";

const MAX_CONFLICT_RETRIES: u32 = 3;

/// Handle returned by `register`, used for all subsequent operations on a
/// fact type. Registration is explicit and happens once at startup; there is
/// no global registry scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactHandle(String);

impl FactHandle {
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The reconciliation orchestrator: dirty marking, conditional recomputation,
/// freeze/delete gating, and notification dispatch, over one store.
///
/// Concurrent updates for different identifiers are independent; for the same
/// identifier the store's row-level locking (SQLite busy handling surfaced as
/// `StorageError::Conflict`) provides mutual exclusion, and the engine retries
/// a bounded number of times.
pub struct ReconciliationEngine {
    store: SqliteStore,
    registry: BTreeMap<String, SchemaDescriptor>,
    local_offset: UtcOffset,
}

impl ReconciliationEngine {
    pub fn new(store: SqliteStore) -> Self {
        Self::with_local_offset(store, UtcOffset::UTC)
    }

    /// `local_offset` is the timezone applied to timezone-aware timestamps
    /// before truncating them into calendar/hour dimension keys.
    pub fn with_local_offset(store: SqliteStore, local_offset: UtcOffset) -> Self {
        Self {
            store,
            registry: BTreeMap::new(),
            local_offset,
        }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    /// Register a fact type under `name`. The descriptor is validated here,
    /// once; a misdeclared schema is unusable until fixed.
    pub fn register(
        &mut self,
        name: &str,
        schema: SchemaDescriptor,
    ) -> Result<FactHandle, EngineError> {
        schema.validate().map_err(|e| EngineError::Configuration {
            fact: name.to_string(),
            reason: e.to_string(),
        })?;
        if self.registry.contains_key(name) {
            return Err(EngineError::Configuration {
                fact: name.to_string(),
                reason: "fact type is already registered".into(),
            });
        }
        self.registry.insert(name.to_string(), schema);
        Ok(FactHandle(name.to_string()))
    }

    fn descriptor(&self, fact: &FactHandle) -> Result<&SchemaDescriptor, EngineError> {
        self.registry
            .get(fact.name())
            .ok_or_else(|| EngineError::UnknownFactType(fact.name().to_string()))
    }

    /// Extract the unique identifier from a source record per the schema.
    pub fn get_reporting_fact_id(
        &self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
    ) -> Result<RecordKey, EngineError> {
        let schema = self.descriptor(fact)?;
        check_source_type(schema, record)?;
        Ok(schema.record_key(record)?)
    }

    /// Fetch the materialized row for a source record, or a new, unsaved,
    /// dirty record pre-populated with its identifier. Never persists.
    pub fn get_reporting_fact(
        &self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
    ) -> Result<FactRecord, EngineError> {
        let key = self.get_reporting_fact_id(fact, record)?;
        match self.store.find(fact.name(), &key)? {
            Some(existing) => Ok(existing),
            None => Ok(FactRecord::new_unsaved(key)),
        }
    }

    /// Flag the stored row as stale without touching any other field.
    /// Silently a no-op when no row exists yet (the next `record_update`
    /// creates one lazily) and on frozen rows, which never change.
    pub fn mark_dirty(
        &mut self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
    ) -> Result<(), EngineError> {
        let key = self.get_reporting_fact_id(fact, record)?;
        self.store.mark_dirty(fact.name(), &key)?;
        Ok(())
    }

    pub fn needs_update(
        &self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
    ) -> Result<bool, EngineError> {
        Ok(self.get_reporting_fact(fact, record)?.is_dirty)
    }

    /// Permanently exclude the row from further mutation or deletion.
    /// Persists the row (creating it if needed) and is idempotent.
    pub fn freeze(
        &mut self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
    ) -> Result<(), EngineError> {
        let current = self.get_reporting_fact(fact, record)?;
        if current.persisted && current.is_frozen {
            return Ok(());
        }
        let fields: Vec<_> = current.fields.into_iter().collect();
        self.store
            .upsert(fact.name(), &current.key, &fields, current.is_dirty, true)?;
        Ok(())
    }

    /// Reconcile the materialized row with the current source state:
    /// frozen rows are untouched, the delete predicate removes stale rows,
    /// and a dirty (or forced) row has every declared field recomputed and
    /// committed atomically, clearing the dirty flag.
    ///
    /// Store-level write conflicts are retried a bounded number of times
    /// before surfacing as `PersistenceConflict`.
    pub fn record_update(
        &mut self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
        force: bool,
    ) -> Result<(), EngineError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.record_update_once(fact, record, force) {
                Err(EngineError::Storage(StorageError::Conflict(reason))) => {
                    if attempts >= MAX_CONFLICT_RETRIES {
                        return Err(EngineError::PersistenceConflict { attempts, reason });
                    }
                }
                other => return other,
            }
        }
    }

    fn record_update_once(
        &mut self,
        fact: &FactHandle,
        record: &dyn SourceRecord,
        force: bool,
    ) -> Result<(), EngineError> {
        let schema = self
            .registry
            .get(fact.name())
            .ok_or_else(|| EngineError::UnknownFactType(fact.name().to_string()))?;
        check_source_type(schema, record)?;
        let key = schema.record_key(record)?;

        let current = match self.store.find(fact.name(), &key)? {
            Some(existing) => existing,
            None => FactRecord::new_unsaved(key.clone()),
        };

        if current.is_frozen {
            return Ok(());
        }

        if let Some(delete_when) = &schema.delete_when
            && delete_when(record)
        {
            // A row that was never persisted is simply not created.
            if current.persisted {
                debug!(fact = fact.name(), key = %key, "delete predicate matched, removing row");
                self.store.delete(fact.name(), &key)?;
            }
            return Ok(());
        }

        if !(current.is_dirty || force) {
            // Clean and unforced: leave the row untouched. A pre-existing
            // unsaved record is not persisted as a side effect.
            return Ok(());
        }

        // Resolve every declared field before writing anything, so a fatal
        // resolution failure commits nothing.
        let mut fields = Vec::with_capacity(schema.fields.len());
        for spec in &schema.fields {
            let raw = resolve_raw(spec, record);
            let value = match &spec.kind {
                FieldKind::Scalar => raw,
                FieldKind::Dimension(kind) => resolve_dimension_key(
                    &self.store,
                    kind,
                    &raw,
                    self.local_offset,
                    &spec.name,
                )?,
            };
            fields.push((spec.name.clone(), value));
        }

        self.store.upsert(fact.name(), &key, &fields, false, false)?;
        Ok(())
    }

    /// Notification hook called synchronously by the source-of-truth layer
    /// after each commit. Creation persists a fresh dirty row for every
    /// matching fact type; an update marks the existing rows dirty.
    pub fn on_source_saved(
        &mut self,
        record: &dyn SourceRecord,
        was_created: bool,
    ) -> Result<(), EngineError> {
        let matching: Vec<String> = self
            .registry
            .iter()
            .filter(|(_, schema)| schema.matches(record))
            .map(|(name, _)| name.clone())
            .collect();

        for name in matching {
            let handle = FactHandle(name);
            if was_created {
                let fresh = self.get_reporting_fact(&handle, record)?;
                if !fresh.persisted {
                    self.store
                        .upsert(handle.name(), &fresh.key, &[], true, false)?;
                }
            } else {
                self.mark_dirty(&handle, record)?;
            }
        }
        Ok(())
    }

    /// Seed the calendar dimension over an inclusive date range.
    pub fn init_date_dimension(&mut self, start: Date, end: Date) -> Result<u64, EngineError> {
        seed::init_date_dimension(&mut self.store, start, end)
    }

    /// Seed the 24 hour-of-day bucket rows.
    pub fn init_hour_dimension(&mut self) -> Result<u64, EngineError> {
        seed::init_hour_dimension(&mut self.store)
    }
}

fn check_source_type(
    schema: &SchemaDescriptor,
    record: &dyn SourceRecord,
) -> Result<(), EngineError> {
    if !schema.matches(record) {
        return Err(EngineError::TypeMismatch {
            expected: schema.source_type.clone(),
            got: record.entity_type().to_string(),
        });
    }
    Ok(())
}
