use arrow::datatypes::DataType;
use rusqlite::types::Value;

#[derive(Debug, thiserror::Error)]
pub enum SqlArrayError {
    #[error("Query returned no rows, unable to determine column types")]
    EmptyResult,

    #[error("Expected {expected} column types, query returns {actual} columns")]
    TypeCountMismatch { expected: usize, actual: usize },

    #[error("Header names are required when the input has no header record")]
    MissingHeader,

    #[error("Input has no data record to infer column types from")]
    NoDataRecord,

    #[error("Header has {names} names, first data record has {fields} fields")]
    RecordWidthMismatch { names: usize, fields: usize },

    #[error("Missing column in source: {0}")]
    ColumnNotFound(String),

    #[error("Column index {index} out of bounds for {len} source columns")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    #[error("Column arrays have mismatched lengths, expected {expected}, got {actual}")]
    ColumnLengthMismatch { expected: usize, actual: usize },

    #[error("Duplicate field name in record layout: {0}")]
    DuplicateFieldName(String),

    #[error("Invalid conversion from {from:?} to {to}")]
    InvalidConversion { from: Value, to: DataType },

    #[error("Index {index} out of range for matrix dimension of size {len}")]
    ShapeMismatch { index: usize, len: usize },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

pub type Result<T, E = SqlArrayError> = std::result::Result<T, E>;
