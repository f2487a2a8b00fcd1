use time::macros::{date, datetime, offset, time};

use factmart_core::{RecordKey, Value};
use factmart_engine::{EngineError, DATE_DIMENSION, HOUR_DIMENSION};
use factmart_harness::{order, TestMart, ANONYMOUS_CUSTOMER};
use factmart_storage::DimensionCatalog;

// ============================================================================
// Date and hour buckets
// ============================================================================

#[test]
fn timestamps_bucket_into_date_and_hour() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // created_on is 2018-09-16 20:53:12 UTC.
    let record = order(1);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(
        fact.field("ordered_date"),
        Some(&Value::Date(date!(2018 - 09 - 16)))
    );
    assert_eq!(fact.field("ordered_hour"), Some(&Value::Time(time!(20:00))));
    Ok(())
}

#[test]
fn timestamps_localize_before_truncation() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::with_local_offset(offset!(-7))?;
    let orders = mart.register_orders()?;

    // 02:53 UTC on the 17th is 19:53 on the 16th at UTC-7.
    let record = order(1).with(
        "created_on",
        Value::Timestamp(datetime!(2018-09-17 02:53:00 UTC)),
    );
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(
        fact.field("ordered_date"),
        Some(&Value::Date(date!(2018 - 09 - 16)))
    );
    assert_eq!(fact.field("ordered_hour"), Some(&Value::Time(time!(19:00))));
    Ok(())
}

#[test]
fn null_timestamps_leave_the_buckets_null() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    let record = order(1).with("created_on", Value::Null);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("ordered_date"), Some(&Value::Null));
    assert_eq!(fact.field("ordered_hour"), Some(&Value::Null));
    Ok(())
}

#[test]
fn unseeded_dates_fail_the_update() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // The fixture calendar covers 2018 only.
    let record = order(1).with(
        "created_on",
        Value::Timestamp(datetime!(2019-01-01 00:00:00 UTC)),
    );
    assert!(matches!(
        mart.engine.record_update(&orders, &record, false),
        Err(EngineError::DimensionLookup(_))
    ));

    // Nothing was committed.
    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert!(!fact.persisted);
    Ok(())
}

// ============================================================================
// Entity references
// ============================================================================

#[test]
fn entity_references_resolve_to_the_dimension_key() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;
    mart.seed_customer(1, "Ada")?;
    mart.seed_product("SKU-100", "Widget")?;

    let record = order(1);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("customer"), Some(&Value::Integer(1)));
    assert_eq!(fact.field("product"), Some(&Value::Text("SKU-100".into())));
    Ok(())
}

#[test]
fn missing_dimension_rows_resolve_to_null() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // Customer 1 is never seeded. Unlike date/hour buckets, a generic
    // reference miss does not abort the update.
    let record = order(1);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert!(fact.persisted);
    assert_eq!(fact.field("customer"), Some(&Value::Null));
    Ok(())
}

#[test]
fn absent_references_use_the_sentinel() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    let record = order(1).with("customer", Value::Null);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(
        fact.field("customer"),
        Some(&Value::Integer(ANONYMOUS_CUSTOMER))
    );
    Ok(())
}

#[test]
fn absent_references_without_a_sentinel_are_null() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // The empty string counts as absent, like null.
    let record = order(1).with("product", Value::Text(String::new()));
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("product"), Some(&Value::Null));
    Ok(())
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn seeding_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;

    // The fixture already seeded all of 2018 and the 24 hour buckets.
    assert_eq!(
        mart.engine
            .init_date_dimension(date!(2018 - 01 - 01), date!(2018 - 12 - 31))?,
        0
    );
    assert_eq!(mart.engine.init_hour_dimension()?, 0);

    // Extending the range only inserts the new days.
    assert_eq!(
        mart.engine
            .init_date_dimension(date!(2018 - 12 - 30), date!(2019 - 01 - 02))?,
        2
    );
    Ok(())
}

#[test]
fn seeded_rows_carry_display_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let mart = TestMart::new()?;
    let store = mart.engine.store();

    let day = store
        .find_dimension(DATE_DIMENSION, &RecordKey::from(date!(2018 - 09 - 16)))?
        .ok_or("missing calendar row")?;
    assert_eq!(
        day.attributes.get("isoformat"),
        Some(&Value::Text("2018-09-16".into()))
    );
    assert_eq!(
        day.attributes.get("quarter_format"),
        Some(&Value::Text("Q3 18".into()))
    );
    assert_eq!(
        day.attributes.get("month_format"),
        Some(&Value::Text("Sep 2018".into()))
    );
    // A Sunday.
    assert_eq!(day.attributes.get("day_of_week"), Some(&Value::Integer(6)));

    let evening = store.find_dimension(HOUR_DIMENSION, &RecordKey::from(time!(20:00)))?;
    assert_eq!(
        evening.ok_or("missing hour row")?.attributes.get("us_format"),
        Some(&Value::Text("8:00 PM".into()))
    );
    Ok(())
}
