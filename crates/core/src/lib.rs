pub mod dimension;
pub mod error;
pub mod key;
pub mod resolve;
pub mod schema;
pub mod source;
pub mod value;

pub use error::CoreError;
pub use key::RecordKey;
pub use schema::{DimensionKind, FieldKind, FieldSpec, SchemaDescriptor};
pub use source::{ComputeFn, DeletePredicate, SourceRecord};
pub use value::Value;
