use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use rusqlite::Connection;
use tracing::debug;

use super::{Compression, CsvReadOptions};
use crate::errors::Result;
use crate::schema::{TextHeader, text_rows_to_table};
use crate::types::Tag;

/// Load a delimited text file into a new table.
///
/// Returns the created column names and their inferred types.
pub fn csv_to_table(
    conn: &Connection,
    table: &str,
    path: impl AsRef<Path>,
    opts: &CsvReadOptions,
) -> Result<Vec<(String, Tag)>> {
    let path = path.as_ref();
    debug!(?path, %table, ?opts, "loading csv file");

    let header = TextHeader::try_new(opts.skip_header, opts.header.clone())?;

    let file = BufReader::new(File::open(path)?);
    let source: Box<dyn Read> = match opts.compression {
        Compression::None => Box::new(file),
        Compression::Gzip => Box::new(GzDecoder::new(file)),
    };

    load_records(conn, table, source, opts, header)
}

/// Load delimited text from any reader into a new table.
///
/// Compression in `opts` is ignored, the reader is expected to produce plain
/// text.
pub fn read_csv_to_table<R: Read>(
    conn: &Connection,
    table: &str,
    source: R,
    opts: &CsvReadOptions,
) -> Result<Vec<(String, Tag)>> {
    let header = TextHeader::try_new(opts.skip_header, opts.header.clone())?;
    load_records(conn, table, source, opts, header)
}

fn load_records<R: Read>(
    conn: &Connection,
    table: &str,
    source: R,
    opts: &CsvReadOptions,
    header: TextHeader,
) -> Result<Vec<(String, Tag)>> {
    let reader = opts.dialect.csv_reader_builder().from_reader(source);
    let records = reader.into_records().map(|record| -> Result<Vec<String>> {
        let record = record?;
        Ok(record.iter().map(String::from).collect())
    });

    text_rows_to_table(conn, table, records, header)
}
