use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("core error: {0}")]
    Core(#[from] factmart_core::CoreError),
}

/// Busy/locked failures surface as `Conflict` so the engine can apply its
/// bounded retry; everything else passes through as `Sqlite`.
impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Conflict(e.to_string())
            }
            _ => StorageError::Sqlite(e),
        }
    }
}
