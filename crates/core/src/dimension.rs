use time::{Date, OffsetDateTime, Time, UtcOffset};

use crate::error::CoreError;
use crate::value::Value;

/// Sentinel day-of-week for the "none" calendar row.
pub const DAY_NONE: i64 = -1;

/// Truncate a raw value to the calendar-date natural key of the Date
/// dimension. Timezone-aware timestamps are converted to the configured
/// local offset first; plain dates pass through; null stays unresolved.
pub fn date_key(value: &Value, local: UtcOffset) -> Result<Option<Date>, CoreError> {
    match value {
        Value::Null => Ok(None),
        Value::Date(d) => Ok(Some(*d)),
        Value::Timestamp(ts) => Ok(Some(ts.to_offset(local).date())),
        other => Err(CoreError::InvalidValue(format!(
            "cannot derive a calendar date from {other:?}"
        ))),
    }
}

/// Truncate a raw value to the top-of-the-hour natural key of the Hour
/// dimension, with the same timezone handling as `date_key`.
pub fn hour_key(value: &Value, local: UtcOffset) -> Result<Option<Time>, CoreError> {
    let time_of_day = match value {
        Value::Null => return Ok(None),
        Value::Time(t) => *t,
        Value::Timestamp(ts) => ts.to_offset(local).time(),
        other => {
            return Err(CoreError::InvalidValue(format!(
                "cannot derive an hour bucket from {other:?}"
            )));
        }
    };
    truncate_to_hour(time_of_day).map(Some)
}

pub fn truncate_to_hour(t: Time) -> Result<Time, CoreError> {
    Time::from_hms(t.hour(), 0, 0).map_err(|e| CoreError::InvalidValue(e.to_string()))
}

/// Display attributes of a Date dimension row. Computed once at seeding time
/// and stored as immutable derived fields, never recomputed per lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateAttributes {
    pub isoformat: String,
    /// "Q<n> <2-digit-year>", e.g. "Q3 18".
    pub quarter_format: String,
    /// "<abbrev-month> <year>", e.g. "Sep 2018".
    pub month_format: String,
    /// Monday = 0 .. Sunday = 6; DAY_NONE for the placeholder row.
    pub day_of_week: i64,
    pub week_number: i64,
    /// "<week> <year>".
    pub week_number_year: String,
}

impl DateAttributes {
    pub fn for_date(d: Date) -> Self {
        let month = u8::from(d.month());
        let quarter = (month - 1) / 3 + 1;
        let month_name = d.month().to_string();
        // The ISO week year differs from the calendar year at the boundaries
        // (e.g. Dec 31 can belong to week 1 of the next year).
        let (week_year, week, _) = d.to_iso_week_date();
        let week = i64::from(week);
        Self {
            isoformat: format!("{:04}-{:02}-{:02}", d.year(), month, d.day()),
            quarter_format: format!("Q{} {:02}", quarter, d.year().rem_euclid(100)),
            month_format: format!("{} {}", &month_name[..3], d.year()),
            day_of_week: i64::from(d.weekday().number_days_from_monday()),
            week_number: week,
            week_number_year: format!("{} {}", week, week_year),
        }
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        vec![
            ("isoformat".into(), Value::Text(self.isoformat)),
            ("quarter_format".into(), Value::Text(self.quarter_format)),
            ("month_format".into(), Value::Text(self.month_format)),
            ("day_of_week".into(), Value::Integer(self.day_of_week)),
            ("week_number".into(), Value::Integer(self.week_number)),
            (
                "week_number_year".into(),
                Value::Text(self.week_number_year),
            ),
        ]
    }
}

/// Display attributes of an Hour dimension row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourAttributes {
    /// 12-hour US label, e.g. "1:00 PM".
    pub us_format: String,
}

impl HourAttributes {
    pub fn for_hour(t: Time) -> Self {
        let hour = t.hour();
        let period = if hour < 12 { "AM" } else { "PM" };
        let display = match hour % 12 {
            0 => 12,
            h => h,
        };
        Self {
            us_format: format!("{display}:00 {period}"),
        }
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        vec![("us_format".into(), Value::Text(self.us_format))]
    }
}
