use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::ByteRecord;
use rusqlite::Connection;
use rusqlite::types::{Value, ValueRef};
use tracing::debug;

use super::CsvWriteOptions;
use crate::encode::encode_value;
use crate::errors::Result;
use crate::introspect::ProbedQuery;

/// Execute a query and write its results to a file as delimited text.
///
/// The query is fully drained before the file is touched, so a query that
/// fails or returns no rows leaves an existing file as it was. Otherwise the
/// file is created, or truncated if it exists. A write error leaves anything
/// already written in place.
pub fn query_to_csv(
    conn: &Connection,
    query: &str,
    path: impl AsRef<Path>,
    opts: &CsvWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    debug!(%query, ?path, "writing query results to csv file");

    let (names, columns) = drain_query(conn, query)?;
    let file = File::create(path)?;
    write_records(&names, &columns, file, opts)
}

/// Execute a query and write its results to `output` as delimited text.
///
/// The header record holds the column names verbatim, duplicates included.
/// Values are written in their text form, NULL as an empty field. The full
/// result is buffered before anything is written.
pub fn write_query_csv<W: Write>(
    conn: &Connection,
    query: &str,
    output: W,
    opts: &CsvWriteOptions,
) -> Result<()> {
    let (names, columns) = drain_query(conn, query)?;
    write_records(&names, &columns, output, opts)
}

fn drain_query(conn: &Connection, query: &str) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, None)?;
    probed.into_columns()
}

fn write_records<W: Write>(
    names: &[String],
    columns: &[Vec<Value>],
    output: W,
    opts: &CsvWriteOptions,
) -> Result<()> {
    let mut csv_writer = opts
        .dialect
        .csv_writer_builder()
        .terminator(opts.terminator.as_csv())
        .from_writer(output);

    let mut record = ByteRecord::with_capacity(1024, names.len());

    if !opts.skip_header {
        for name in names {
            record.push_field(name.as_bytes());
        }
        csv_writer.write_record(&record)?;
    }

    let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut format_buf = String::new();
    for row in 0..num_rows {
        record.clear();
        for col in columns {
            format_buf.clear();
            encode_value(&mut format_buf, ValueRef::from(&col[row]))?;
            record.push_field(format_buf.as_bytes());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    debug!(num_rows, "wrote csv records");

    Ok(())
}
