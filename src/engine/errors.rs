use std::io;
use thiserror::Error;
use tracing::{debug, error};

use crate::engine::types::DType;

/// Errors surfaced by every table, codec and client operation.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("null argument: {0}")]
    NullArgument(&'static str),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: DType, actual: String },

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("codec failure: {0}")]
    Codec(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unknown dtype code: {0}")]
    UnknownDType(i32),

    #[error("unknown dtype name: {0}")]
    UnknownDTypeName(String),

    #[error("array builder already finished")]
    BuilderFinished,

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl TableError {
    pub fn type_mismatch(expected: DType, actual: impl ToString) -> Self {
        TableError::TypeMismatch {
            expected,
            actual: actual.to_string(),
        }
    }

    pub fn log_error(&self) {
        match self {
            TableError::Codec(e) => {
                error!("Codec failure: {}", e);
                debug!("Codec failure details: {:?}", self);
            }
            TableError::Store(e) => {
                error!("Store failure: {}", e);
                debug!("Store failure details: {:?}", self);
            }
            TableError::NotFound(e) => {
                error!("Not found: {}", e);
            }
            TableError::InvariantViolation(e) => {
                error!("Internal invariant violated: {}", e);
                debug!("Invariant violation details: {:?}", self);
            }
            other => {
                error!("{}", other);
            }
        }
    }
}

impl From<arrow_schema::ArrowError> for TableError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        TableError::Codec(err.to_string())
    }
}

impl From<StoreError> for TableError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TableError::NotFound(format!("object {id}")),
            other => TableError::Store(other.to_string()),
        }
    }
}

/// Errors reported by object store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("object {0} not found")]
    NotFound(String),

    #[error("object {0} already exists")]
    AlreadyExists(String),

    #[error("object {0} was not created by this client")]
    NotCreated(String),

    #[error("object {0} is not sealed")]
    NotSealed(String),

    #[error("object {0} is not held by this client")]
    NotHeld(String),

    #[error("object {0} is still in use")]
    InUse(String),

    #[error("store connection is closed")]
    Disconnected,

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TableError>;
