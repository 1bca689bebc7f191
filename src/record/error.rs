use super::record::RecordId;
use crate::expr::ExprError;
use crate::file::FileError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("Table not open: {0}")]
    TableNotOpen(String),

    #[error("Record of {record_size} bytes does not fit a single page slot")]
    RecordTooLarge { record_size: usize },

    #[error("Schema has no attributes")]
    EmptySchema,

    #[error("Record size mismatch: expected {expected}, got {actual}")]
    InvalidRecordSize { expected: usize, actual: usize },

    #[error("Expected {expected} values, got {actual}")]
    WrongValueCount { expected: usize, actual: usize },

    #[error("Invalid slot: {rid}")]
    InvalidSlot { rid: RecordId },

    #[error("No record at {0}")]
    RecordNotFound(RecordId),

    #[error("Record has not been inserted yet")]
    RecordNotInserted,

    #[error("Invalid attribute index: {0}")]
    InvalidAttribute(usize),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Key refers to missing attribute index {0}")]
    InvalidKeyAttribute(usize),

    #[error("Serialized schema needs {needed} bytes, header page has {available}")]
    SchemaTooLarge { needed: usize, available: usize },

    #[error("Corrupt table file: {0}")]
    Corrupt(String),
}

pub type RecordResult<T> = Result<T, RecordError>;
