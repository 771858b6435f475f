use crate::catalog::CatalogError;
use crate::error::{ErrorKind, codes};
use crate::file::{FileError, PageId};
use thiserror::Error;

use super::record::SlotId;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid page number: {0}")]
    InvalidPageNumber(PageId),

    #[error("Invalid slot number: {0}")]
    InvalidSlotNumber(SlotId),

    #[error("No record at page_id={0}, slot_id={1}")]
    RecordNotFound(PageId, SlotId),

    #[error("Record has no id")]
    MissingRecordId,

    #[error("Attribute index out of range: {0}")]
    InvalidAttribute(usize),

    #[error("Unknown data type code: {0}")]
    UnknownDataType(u8),

    #[error("No more tuples")]
    NoMoreTuples,

    #[error("Cannot compare values of different data types: {0} and {1}")]
    CompareDifferentTypes(&'static str, &'static str),

    #[error("Expression result is not boolean")]
    ExprNotBoolean,

    #[error("Boolean operator argument is not boolean")]
    BooleanArgNotBoolean,

    #[error("Record larger than a page: {0} bytes")]
    RecordTooLarge(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::File(e) => e.kind(),
            RecordError::Catalog(e) => e.kind(),
            RecordError::RecordNotFound(..) | RecordError::NoMoreTuples => ErrorKind::NotFound,
            RecordError::RecordTooLarge(_) => ErrorKind::ResourceExhausted,
            _ => ErrorKind::InvalidArgument,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RecordError::File(e) => e.code(),
            RecordError::InvalidPageNumber(_) => codes::INVALID_PAGE_NUM,
            RecordError::InvalidSlotNumber(_) => codes::INVALID_SLOT_NUM,
            RecordError::NoMoreTuples => codes::NO_MORE_TUPLES,
            RecordError::UnknownDataType(_) => codes::UNKNOWN_DATATYPE,
            RecordError::CompareDifferentTypes(..) => codes::COMPARE_DIFFERENT_TYPES,
            RecordError::ExprNotBoolean => codes::EXPR_NOT_BOOLEAN,
            RecordError::BooleanArgNotBoolean => codes::BOOLEAN_ARG_NOT_BOOLEAN,
            other => other.kind().code(),
        }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
