use std::sync::Arc;

use crate::value::Value;

/// Read-only view of an external, mutable business record. The engine only
/// ever reads through this trait; the source of truth stays owned by the
/// caller's system.
pub trait SourceRecord {
    /// The declared entity type name, matched against
    /// `SchemaDescriptor::source_type` before any fact operation.
    fn entity_type(&self) -> &str;

    /// Fetch a named attribute. `None` means the record has no such field;
    /// `Some(Value::Null)` means the field exists but is unset.
    fn field(&self, name: &str) -> Option<Value>;
}

/// A computed field: an arbitrary pure function of the whole source record,
/// not limited to a single attribute (e.g. reaching through a relation).
pub type ComputeFn = Arc<dyn Fn(&dyn SourceRecord) -> Option<Value> + Send + Sync>;

/// The delete predicate from the schema: when it evaluates true on the
/// current source state, the materialized row is removed (unless frozen).
pub type DeletePredicate = Arc<dyn Fn(&dyn SourceRecord) -> bool + Send + Sync>;
