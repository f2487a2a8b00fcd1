use crate::schema::FieldSpec;
use crate::source::SourceRecord;
use crate::value::Value;

/// Produce the raw value for one declared field from the current source
/// state. Computed takes precedence over aliased, aliased over a direct read
/// of the destination name. Never mutates the source record.
pub fn resolve_raw(spec: &FieldSpec, record: &dyn SourceRecord) -> Value {
    if let Some(compute) = &spec.computed {
        return compute(record).unwrap_or(Value::Null);
    }
    if let Some(alias) = &spec.alias {
        return record.field(alias).unwrap_or(Value::Null);
    }
    record.field(&spec.name).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Item;

    impl SourceRecord for Item {
        fn entity_type(&self) -> &str {
            "item"
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "total" => Some(Value::Float(10.0)),
                "grand_total" => Some(Value::Float(12.5)),
                _ => None,
            }
        }
    }

    #[test]
    fn direct_reads_destination_name() {
        let spec = FieldSpec::direct("total");
        assert_eq!(resolve_raw(&spec, &Item), Value::Float(10.0));
    }

    #[test]
    fn alias_beats_direct() {
        let spec = FieldSpec::aliased("total", "grand_total");
        assert_eq!(resolve_raw(&spec, &Item), Value::Float(12.5));
    }

    #[test]
    fn computed_beats_alias() {
        let mut spec = FieldSpec::aliased("total", "grand_total");
        spec.computed = Some(Arc::new(|_: &dyn SourceRecord| Some(Value::Float(99.0))));
        assert_eq!(resolve_raw(&spec, &Item), Value::Float(99.0));
    }

    #[test]
    fn computed_none_becomes_null() {
        let spec = FieldSpec::computed("total", Arc::new(|_: &dyn SourceRecord| None));
        assert_eq!(resolve_raw(&spec, &Item), Value::Null);
    }

    #[test]
    fn unknown_field_resolves_to_null() {
        let spec = FieldSpec::direct("missing");
        assert_eq!(resolve_raw(&spec, &Item), Value::Null);
    }
}
