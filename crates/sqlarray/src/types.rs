//! Column type classification shared by text and array inference.

use std::fmt;

use arrow::datatypes::DataType;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SqlArrayError};

/// Engine-agnostic column type. Also used verbatim as the declared type when
/// creating tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Int,
    Real,
    String,
}

impl Tag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tag::Int => "int",
            Tag::Real => "real",
            Tag::String => "string",
        }
    }

    /// Classify a single text token.
    ///
    /// Surrounding whitespace is ignored. An optionally signed run of digits is
    /// an integer, with single underscores allowed between digits. Integers
    /// are not range checked, a token too wide for 64 bits is still `Int`.
    /// Otherwise floating point parsing is tried. Anything else, including the
    /// empty string, is a string.
    pub fn from_text(token: &str) -> Self {
        let token = token.trim();
        if is_integer_literal(token) {
            Tag::Int
        } else if token.parse::<f64>().is_ok() {
            Tag::Real
        } else {
            Tag::String
        }
    }

    /// Classify an array element type.
    ///
    /// Only 32 and 64 bit signed integers and floats are numeric, every other
    /// type maps to string.
    pub fn from_datatype(datatype: &DataType) -> Self {
        match datatype {
            DataType::Int32 | DataType::Int64 => Tag::Int,
            DataType::Float32 | DataType::Float64 => Tag::Real,
            _ => Tag::String,
        }
    }
}

fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty()
        && digits
            .split('_')
            .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()))
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts the text form of an array cell into the value bound on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConverter {
    Integer,
    Float,
    Text,
}

impl ValueConverter {
    /// Pick the converter for an array element type. Mirrors
    /// [`Tag::from_datatype`].
    pub fn for_datatype(datatype: &DataType) -> Self {
        match Tag::from_datatype(datatype) {
            Tag::Int => ValueConverter::Integer,
            Tag::Real => ValueConverter::Float,
            Tag::String => ValueConverter::Text,
        }
    }

    pub fn convert(&self, text: &str) -> Result<Value> {
        match self {
            ValueConverter::Integer => {
                text.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| SqlArrayError::InvalidConversion {
                        from: Value::Text(text.to_string()),
                        to: DataType::Int64,
                    })
            }
            ValueConverter::Float => {
                text.parse::<f64>()
                    .map(Value::Real)
                    .map_err(|_| SqlArrayError::InvalidConversion {
                        from: Value::Text(text.to_string()),
                        to: DataType::Float64,
                    })
            }
            ValueConverter::Text => Ok(Value::Text(text.to_string())),
        }
    }
}

/// The array element type a single SQLite value naturally maps to.
pub fn datatype_of_value(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Integer(_) => DataType::Int64,
        Value::Real(_) => DataType::Float64,
        Value::Text(_) => DataType::Utf8,
        Value::Blob(_) => DataType::Binary,
    }
}
