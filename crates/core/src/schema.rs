use crate::error::CoreError;
use crate::key::RecordKey;
use crate::source::{ComputeFn, DeletePredicate, SourceRecord};

/// How a single materialized field obtains its raw value from the source
/// record, and whether it is a plain scalar or a dimension reference.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub alias: Option<String>,
    pub computed: Option<ComputeFn>,
    pub kind: FieldKind,
}

#[derive(Clone)]
pub enum FieldKind {
    Scalar,
    Dimension(DimensionKind),
}

#[derive(Clone)]
pub enum DimensionKind {
    /// Calendar date bucket; the raw value is localized and truncated to a
    /// date and must match a pre-seeded row.
    Date,
    /// Hour-of-day bucket; localized and truncated to the top of the hour.
    Hour,
    /// Reference into an arbitrary dimension table. The raw value is the
    /// referenced row's unique identifier. A miss resolves to the configured
    /// sentinel key if one is declared, otherwise to null.
    Entity {
        dimension: String,
        empty_sentinel: Option<RecordKey>,
    },
}

impl FieldSpec {
    pub fn direct(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            computed: None,
            kind: FieldKind::Scalar,
        }
    }

    /// Read a differently-named source attribute. Lets two materialized
    /// fields derive from one source value (e.g. a date and an hour bucket
    /// both reading `created_on`).
    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
            computed: None,
            kind: FieldKind::Scalar,
        }
    }

    pub fn computed(name: &str, compute: ComputeFn) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            computed: Some(compute),
            kind: FieldKind::Scalar,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn date_dimension(self) -> Self {
        self.with_kind(FieldKind::Dimension(DimensionKind::Date))
    }

    pub fn hour_dimension(self) -> Self {
        self.with_kind(FieldKind::Dimension(DimensionKind::Hour))
    }

    pub fn entity_dimension(self, dimension: &str) -> Self {
        self.with_kind(FieldKind::Dimension(DimensionKind::Entity {
            dimension: dimension.to_string(),
            empty_sentinel: None,
        }))
    }

    pub fn entity_dimension_with_sentinel(self, dimension: &str, sentinel: RecordKey) -> Self {
        self.with_kind(FieldKind::Dimension(DimensionKind::Entity {
            dimension: dimension.to_string(),
            empty_sentinel: Some(sentinel),
        }))
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self.kind, FieldKind::Dimension(_))
    }
}

/// Static declaration of one fact (or dimension) type: which source entity it
/// reports on, which field keys it, which fields to materialize and how, and
/// when a row should be removed. Built once at startup and validated at
/// registration; validation failure is a fatal configuration error.
#[derive(Clone)]
pub struct SchemaDescriptor {
    pub source_type: String,
    pub unique_identifier: String,
    pub fields: Vec<FieldSpec>,
    pub delete_when: Option<DeletePredicate>,
}

impl SchemaDescriptor {
    pub fn new(source_type: &str, unique_identifier: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            unique_identifier: unique_identifier.to_string(),
            fields: Vec::new(),
            delete_when: None,
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn delete_when(mut self, predicate: DeletePredicate) -> Self {
        self.delete_when = Some(predicate);
        self
    }

    /// Registration-time validation. Never called per record.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source_type.is_empty() {
            return Err(CoreError::Configuration(
                "a source entity type must be declared".into(),
            ));
        }
        if self.unique_identifier.is_empty() {
            return Err(CoreError::Configuration(
                "a unique identifier field must be declared".into(),
            ));
        }
        for (i, spec) in self.fields.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(CoreError::Configuration(format!(
                    "field #{i} has an empty destination name"
                )));
            }
            if self
                .fields
                .iter()
                .skip(i + 1)
                .any(|other| other.name == spec.name)
            {
                return Err(CoreError::Configuration(format!(
                    "duplicate field '{}'",
                    spec.name
                )));
            }
            // Dimension and relation types cannot serve as the identifier.
            if spec.name == self.unique_identifier && spec.is_dimension() {
                return Err(CoreError::Configuration(format!(
                    "unique identifier '{}' must be a scalar field, not a dimension reference",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    pub fn matches(&self, record: &dyn SourceRecord) -> bool {
        record.entity_type() == self.source_type
    }

    /// Extract the record key per the declared unique-identifier field.
    /// Unsupported scalar kinds (null, boolean) are rejected here.
    pub fn record_key(&self, record: &dyn SourceRecord) -> Result<RecordKey, CoreError> {
        let value = record
            .field(&self.unique_identifier)
            .ok_or_else(|| CoreError::MissingField(self.unique_identifier.clone()))?;
        RecordKey::try_from(value)
    }
}
