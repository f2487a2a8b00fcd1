//! Test fixtures: an in-memory engine with pre-seeded calendar and hour
//! dimensions, a map-backed source record, and a ready-made order fact schema
//! exercising every field resolution mode.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::macros::date;
use time::UtcOffset;

use factmart_core::{FieldSpec, RecordKey, SchemaDescriptor, SourceRecord, Value};
use factmart_engine::{EngineError, FactHandle, ReconciliationEngine};
use factmart_storage::{DimensionCatalog, SqliteStore, StorageError};

pub const CUSTOMER_DIMENSION: &str = "customer_dimension";
pub const PRODUCT_DIMENSION: &str = "product_dimension";

/// A mutable, map-backed source record. Tests edit it between reconciliation
/// calls to simulate the source of truth changing under the engine.
#[derive(Debug, Clone)]
pub struct TestRecord {
    entity_type: String,
    fields: BTreeMap<String, Value>,
}

impl TestRecord {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.remove(name);
    }
}

impl SourceRecord for TestRecord {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

/// An engine over an in-memory store with the calendar seeded for 2018 and
/// the hour buckets seeded.
pub struct TestMart {
    pub engine: ReconciliationEngine,
}

impl TestMart {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_local_offset(UtcOffset::UTC)
    }

    pub fn with_local_offset(offset: UtcOffset) -> Result<Self, EngineError> {
        let store = SqliteStore::open_in_memory()?;
        let mut engine = ReconciliationEngine::with_local_offset(store, offset);
        engine.init_date_dimension(date!(2018 - 01 - 01), date!(2018 - 12 - 31))?;
        engine.init_hour_dimension()?;
        Ok(Self { engine })
    }

    /// Register the standard order fact used across the integration tests.
    pub fn register_orders(&mut self) -> Result<FactHandle, EngineError> {
        self.engine.register("order_fact", order_schema())
    }

    pub fn seed_customer(&mut self, id: i64, name: &str) -> Result<bool, StorageError> {
        self.engine.store_mut().seed_dimension(
            CUSTOMER_DIMENSION,
            &RecordKey::from(id),
            &[("name".to_string(), Value::Text(name.to_string()))],
        )
    }

    pub fn seed_product(&mut self, code: &str, label: &str) -> Result<bool, StorageError> {
        self.engine.store_mut().seed_dimension(
            PRODUCT_DIMENSION,
            &RecordKey::from(code),
            &[("label".to_string(), Value::Text(label.to_string()))],
        )
    }
}

/// The order fact: one row per order, keyed by the order id, with a direct
/// scalar, an aliased field, a computed field, date and hour buckets derived
/// from the creation timestamp, and two entity references (one with an
/// "anonymous" sentinel). Cancelled orders are removed.
pub fn order_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("order", "id")
        .field(FieldSpec::direct("total"))
        .field(FieldSpec::aliased("state", "status"))
        .field(FieldSpec::computed(
            "total_cents",
            Arc::new(|record| {
                record
                    .field("total")
                    .and_then(|v| v.as_float())
                    .map(|total| Value::Integer((total * 100.0).round() as i64))
            }),
        ))
        .field(FieldSpec::aliased("ordered_date", "created_on").date_dimension())
        .field(FieldSpec::aliased("ordered_hour", "created_on").hour_dimension())
        .field(FieldSpec::direct("customer").entity_dimension_with_sentinel(
            CUSTOMER_DIMENSION,
            RecordKey::from(ANONYMOUS_CUSTOMER),
        ))
        .field(FieldSpec::direct("product").entity_dimension(PRODUCT_DIMENSION))
        .delete_when(Arc::new(|record| {
            record.field("status").as_ref().and_then(Value::as_text) == Some("cancelled")
        }))
}

/// Sentinel customer key used when an order carries no customer reference.
pub const ANONYMOUS_CUSTOMER: i64 = 0;

/// A paid order with every source attribute the order schema reads.
pub fn order(id: i64) -> TestRecord {
    TestRecord::new("order")
        .with("id", Value::Integer(id))
        .with("total", Value::Float(10.00))
        .with("status", Value::Text("paid".into()))
        .with(
            "created_on",
            Value::Timestamp(time::macros::datetime!(2018-09-16 20:53:12 UTC)),
        )
        .with("customer", Value::Integer(1))
        .with("product", Value::Text("SKU-100".into()))
}
