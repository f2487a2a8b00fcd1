use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid record key: {0}")]
    InvalidKey(String),

    #[error("source record has no field '{0}'")]
    MissingField(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("schema configuration error: {0}")]
    Configuration(String),
}
