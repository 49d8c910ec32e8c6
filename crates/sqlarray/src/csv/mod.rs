//! Loading delimited text into tables and writing query results out as
//! delimited text.

pub mod dialect;

mod export;
mod load;

pub use dialect::DialectOptions;
pub use export::{query_to_csv, write_query_csv};
pub use load::{csv_to_table, read_csv_to_table};
use serde::{Deserialize, Serialize};

/// Compression of a delimited text source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// Line ending written after each record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTerminator {
    #[default]
    Crlf,
    Lf,
}

impl RecordTerminator {
    fn as_csv(&self) -> csv::Terminator {
        match self {
            RecordTerminator::Crlf => csv::Terminator::CRLF,
            RecordTerminator::Lf => csv::Terminator::Any(b'\n'),
        }
    }
}

/// Options for loading delimited text into a new table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvReadOptions {
    pub dialect: DialectOptions,
    /// The input has no header record. `header` must then provide the column
    /// names.
    pub skip_header: bool,
    /// Column names to use instead of the header record.
    pub header: Option<Vec<String>>,
    pub compression: Compression,
}

/// Options for writing query results as delimited text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvWriteOptions {
    pub dialect: DialectOptions,
    /// Don't write a header record with the column names.
    pub skip_header: bool,
    pub terminator: RecordTerminator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_json() {
        let opts: CsvReadOptions = serde_json::from_str(
            r#"{"skip_header": true, "header": ["a", "b"], "compression": "gzip"}"#,
        )
        .unwrap();
        assert_eq!(
            CsvReadOptions {
                dialect: DialectOptions::default(),
                skip_header: true,
                header: Some(vec!["a".to_string(), "b".to_string()]),
                compression: Compression::Gzip,
            },
            opts
        );

        let opts: CsvWriteOptions = serde_json::from_str(r#"{"terminator": "lf"}"#).unwrap();
        assert_eq!(RecordTerminator::Lf, opts.terminator);
        assert!(!opts.skip_header);
    }
}
