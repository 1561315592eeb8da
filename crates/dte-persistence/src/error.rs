//! Persistence error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("identity signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch { expected: String, found: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
