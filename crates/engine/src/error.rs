use factmart_core::CoreError;
use factmart_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("type mismatch: expected source type '{expected}', got '{got}'")]
    TypeMismatch { expected: String, got: String },

    #[error("configuration error for fact type '{fact}': {reason}")]
    Configuration { fact: String, reason: String },

    #[error("unknown fact type: {0}")]
    UnknownFactType(String),

    #[error("dimension lookup failed: {0}")]
    DimensionLookup(String),

    #[error("persistence conflict after {attempts} attempts: {reason}")]
    PersistenceConflict { attempts: u32, reason: String },
}
