use time::UtcOffset;
use tracing::warn;

use factmart_core::dimension::{date_key, hour_key};
use factmart_core::{DimensionKind, RecordKey, Value};
use factmart_storage::{DimensionCatalog, SqliteStore};

use crate::error::EngineError;
use crate::{DATE_DIMENSION, HOUR_DIMENSION};

/// Resolve a raw field value into the identity of a dimension row.
///
/// Calendar and hour buckets must be pre-seeded: a miss there is an
/// operational gap and fails the whole update. A generic entity reference
/// that cannot be found resolves to null (or the configured sentinel for
/// absent raw values) — a lookup miss must never abort the fact update.
pub(crate) fn resolve_dimension_key(
    store: &SqliteStore,
    kind: &DimensionKind,
    raw: &Value,
    local: UtcOffset,
    field_name: &str,
) -> Result<Value, EngineError> {
    match kind {
        DimensionKind::Date => {
            let Some(date) = date_key(raw, local)? else {
                return Ok(Value::Null);
            };
            let key = RecordKey::from(date);
            match store.find_dimension(DATE_DIMENSION, &key)? {
                Some(row) => Ok(row.key.into_value()),
                None => Err(EngineError::DimensionLookup(format!(
                    "no date dimension row for {date} (field '{field_name}'); seed the calendar range first"
                ))),
            }
        }
        DimensionKind::Hour => {
            let Some(hour) = hour_key(raw, local)? else {
                return Ok(Value::Null);
            };
            let key = RecordKey::from(hour);
            match store.find_dimension(HOUR_DIMENSION, &key)? {
                Some(row) => Ok(row.key.into_value()),
                None => Err(EngineError::DimensionLookup(format!(
                    "no hour dimension row for {hour} (field '{field_name}')"
                ))),
            }
        }
        DimensionKind::Entity {
            dimension,
            empty_sentinel,
        } => {
            if raw.is_falsy() {
                return Ok(match empty_sentinel {
                    Some(sentinel) => sentinel.clone().into_value(),
                    None => Value::Null,
                });
            }
            let key = RecordKey::try_from(raw.clone())?;
            match store.find_dimension(dimension, &key)? {
                Some(row) => Ok(row.key.into_value()),
                None => {
                    warn!(
                        dimension,
                        field = field_name,
                        key = %key,
                        "dimension reference miss, resolving to null"
                    );
                    Ok(Value::Null)
                }
            }
        }
    }
}
