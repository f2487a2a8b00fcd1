use std::sync::Arc;

use factmart_core::{FieldSpec, SchemaDescriptor, Value};
use factmart_harness::{order, TestMart, TestRecord};

// ============================================================================
// Field resolution: computed > alias > direct
// ============================================================================

#[test]
fn direct_fields_read_the_same_named_attribute() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    let record = order(1);
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("total"), Some(&Value::Float(10.00)));
    Ok(())
}

#[test]
fn aliased_fields_read_the_source_attribute() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // The fact field is "state"; the source attribute is "status". A source
    // attribute named "state" must be ignored.
    let record = order(1).with("state", Value::Text("decoy".into()));
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("state"), Some(&Value::Text("paid".into())));
    Ok(())
}

#[test]
fn computed_fields_win_over_source_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    // Even with a same-named source attribute present, the compute function
    // decides the value.
    let record = order(1).with("total_cents", Value::Integer(-1));
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("total_cents"), Some(&Value::Integer(1000)));
    Ok(())
}

#[test]
fn absent_attributes_materialize_as_null() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;
    let orders = mart.register_orders()?;

    let mut record = order(1);
    record.remove("total");
    mart.engine.record_update(&orders, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&orders, &record)?;
    assert_eq!(fact.field("total"), Some(&Value::Null));
    // The computed field reads the same absent attribute and yields null too.
    assert_eq!(fact.field("total_cents"), Some(&Value::Null));
    Ok(())
}

#[test]
fn compute_functions_can_combine_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let mut mart = TestMart::new()?;

    let schema = SchemaDescriptor::new("order_item", "id")
        .field(FieldSpec::computed(
            "line_total",
            Arc::new(|record| {
                let price = record.field("unit_price")?.as_float()?;
                let quantity = record.field("quantity")?.as_integer()?;
                Some(Value::Float(price * quantity as f64))
            }),
        ));
    let items = mart.engine.register("order_item_fact", schema)?;

    let record = TestRecord::new("order_item")
        .with("id", Value::Integer(3))
        .with("unit_price", Value::Float(2.50))
        .with("quantity", Value::Integer(4));
    mart.engine.record_update(&items, &record, false)?;

    let fact = mart.engine.get_reporting_fact(&items, &record)?;
    assert_eq!(fact.field("line_total"), Some(&Value::Float(10.0)));
    Ok(())
}
