use time::{Date, Time};

use factmart_core::dimension::{DateAttributes, HourAttributes};
use factmart_core::{CoreError, RecordKey};
use factmart_storage::{DimensionCatalog, SqliteStore};

use crate::error::EngineError;
use crate::{DATE_DIMENSION, HOUR_DIMENSION};

/// Populate the calendar dimension for the inclusive date range. Display
/// attributes (quarter/month labels, day of week, week number) are computed
/// here, once, and never recomputed at lookup time. Already-seeded dates are
/// silently skipped; returns the number of rows actually inserted.
pub fn init_date_dimension(
    store: &mut SqliteStore,
    start: Date,
    end: Date,
) -> Result<u64, EngineError> {
    let mut inserted = 0;
    let mut day = start;
    while day <= end {
        let attributes = DateAttributes::for_date(day).into_fields();
        if store.seed_dimension(DATE_DIMENSION, &RecordKey::from(day), &attributes)? {
            inserted += 1;
        }
        day = match day.next_day() {
            Some(next) => next,
            None => break, // end of the representable calendar
        };
    }
    Ok(inserted)
}

/// Populate the 24 hour-of-day bucket rows. Idempotent like the calendar
/// seeding; returns the number of rows actually inserted.
pub fn init_hour_dimension(store: &mut SqliteStore) -> Result<u64, EngineError> {
    let mut inserted = 0;
    for hour in 0..24 {
        let bucket =
            Time::from_hms(hour, 0, 0).map_err(|e| CoreError::InvalidValue(e.to_string()))?;
        let attributes = HourAttributes::for_hour(bucket).into_fields();
        if store.seed_dimension(HOUR_DIMENSION, &RecordKey::from(bucket), &attributes)? {
            inserted += 1;
        }
    }
    Ok(inserted)
}
