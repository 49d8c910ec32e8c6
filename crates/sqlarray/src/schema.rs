//! Table creation, bulk loading and table introspection.
//!
//! Table and column names are interpolated into the generated SQL as-is,
//! wrapped in single quotes. Names containing a single quote are not escaped
//! and produce invalid (or unintended) statements.

use arrow::array::{Array, ArrayRef};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, trace};

use crate::errors::{Result, SqlArrayError};
use crate::materialize::ColumnMap;
use crate::types::{Tag, ValueConverter};

/// Declared column names and types of a table, lower-cased, in definition
/// order.
pub fn table_schema(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!("pragma table_info({table})"))?;
    let cols = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let decl_type: String = row.get(2)?;
            Ok((name, decl_type.to_lowercase()))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cols)
}

/// Names of all user tables. Internal `sqlite_` tables are excluded.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("select name from sqlite_schema where type='table' and name not like 'sqlite_%'")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn create_table_sql(table: &str, columns: &[(String, Tag)]) -> String {
    let defs = columns
        .iter()
        .map(|(name, tag)| format!("'{name}' {tag}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("create table '{table}' ({defs})")
}

fn insert_sql(table: &str, num_columns: usize) -> String {
    let placeholders = vec!["?"; num_columns].join(", ");
    format!("insert into '{table}' values ({placeholders})")
}

/// Open a transaction for inserts unless one is already in progress, in which
/// case the inserts join it.
fn begin_inserts(conn: &Connection) -> Result<()> {
    if conn.is_autocommit() {
        conn.execute_batch("begin")?;
    } else {
        trace!("joining open transaction");
    }
    Ok(())
}

/// How column names are determined for text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextHeader {
    /// The first record holds the column names.
    FirstRecord,
    /// The first record is a header, but these names replace it.
    Replace(Vec<String>),
    /// The input has no header record. Every record is data.
    Absent(Vec<String>),
}

impl TextHeader {
    /// Resolve from a skip flag and optional explicit names.
    ///
    /// `skip_header` indicates the input has no header record, in which case
    /// names must be provided.
    pub fn try_new(skip_header: bool, names: Option<Vec<String>>) -> Result<Self> {
        match (skip_header, names) {
            (true, Some(names)) => Ok(TextHeader::Absent(names)),
            (true, None) => Err(SqlArrayError::MissingHeader),
            (false, Some(names)) => Ok(TextHeader::Replace(names)),
            (false, None) => Ok(TextHeader::FirstRecord),
        }
    }
}

/// Create a table from tokenized text records and insert every data record.
///
/// Column types are inferred from the first data record only. Every field is
/// bound as text and SQLite's column affinity does any conversion.
///
/// Inserts run in a single transaction, committed once all records are in. A
/// transaction already open on the connection is joined and committed along
/// with the inserts. If an insert fails nothing is committed or rolled back,
/// the error is returned and the next load on the connection joins the
/// leftover transaction.
pub fn text_rows_to_table<I>(
    conn: &Connection,
    table: &str,
    records: I,
    header: TextHeader,
) -> Result<Vec<(String, Tag)>>
where
    I: IntoIterator<Item = Result<Vec<String>>>,
{
    debug!(%table, ?header, "loading text records into table");

    let mut records = records.into_iter();
    let mut next_record = || records.next().transpose();

    let names = match header {
        TextHeader::FirstRecord => next_record()?.ok_or(SqlArrayError::NoDataRecord)?,
        TextHeader::Replace(names) => {
            let _ = next_record()?.ok_or(SqlArrayError::NoDataRecord)?;
            names
        }
        TextHeader::Absent(names) => names,
    };

    let first = next_record()?.ok_or(SqlArrayError::NoDataRecord)?;
    if first.len() != names.len() {
        return Err(SqlArrayError::RecordWidthMismatch {
            names: names.len(),
            fields: first.len(),
        });
    }

    let columns: Vec<(String, Tag)> = names
        .into_iter()
        .zip(first.iter().map(|field| Tag::from_text(field)))
        .collect();
    trace!(?columns, "inferred column types");

    conn.execute(&create_table_sql(table, &columns), [])?;

    begin_inserts(conn)?;

    let mut num_rows = 0;
    {
        let mut insert = conn.prepare(&insert_sql(table, columns.len()))?;
        insert.execute(params_from_iter(first.iter()))?;
        num_rows += 1;
        for record in records {
            let record = record?;
            insert.execute(params_from_iter(record.iter()))?;
            num_rows += 1;
        }
    }

    conn.execute_batch("commit")?;
    debug!(%table, num_rows, "loaded text records");

    Ok(columns)
}

/// Source columns and the header selecting which of them to load.
#[derive(Debug, Clone, Copy)]
pub enum TableColumns<'a> {
    /// Columns by position. The header pairs each output name with the index
    /// of its source column.
    Positional {
        columns: &'a [ArrayRef],
        header: &'a [(String, usize)],
    },
    /// Columns by name. The header lists the names to load.
    Named {
        columns: &'a ColumnMap,
        header: &'a [String],
    },
}

impl<'a> TableColumns<'a> {
    /// Resolve to output names and arrays, in header order.
    fn select(&self) -> Result<Vec<(&'a str, &'a ArrayRef)>> {
        match *self {
            TableColumns::Positional { columns, header } => header
                .iter()
                .map(|(name, idx)| {
                    columns
                        .get(*idx)
                        .map(|array| (name.as_str(), array))
                        .ok_or(SqlArrayError::ColumnIndexOutOfBounds {
                            index: *idx,
                            len: columns.len(),
                        })
                })
                .collect(),
            TableColumns::Named { columns, header } => header
                .iter()
                .map(|name| {
                    columns
                        .get(name)
                        .map(|array| (name.as_str(), array))
                        .ok_or_else(|| SqlArrayError::ColumnNotFound(name.clone()))
                })
                .collect(),
        }
    }
}

/// Create a table from column arrays and insert their rows.
///
/// Created columns follow the header order, regardless of the order of the
/// source. Column types come from the array element types, and each cell is
/// converted to match before binding. Transactions are handled as in
/// [`text_rows_to_table`].
pub fn columns_to_table(
    conn: &Connection,
    table: &str,
    columns: TableColumns<'_>,
) -> Result<Vec<(String, Tag)>> {
    debug!(%table, "loading column arrays into table");

    let selected = columns.select()?;

    let num_rows = selected.first().map(|(_, a)| a.len()).unwrap_or(0);
    for (_, array) in &selected {
        if array.len() != num_rows {
            return Err(SqlArrayError::ColumnLengthMismatch {
                expected: num_rows,
                actual: array.len(),
            });
        }
    }

    let realized: Vec<(String, Tag)> = selected
        .iter()
        .map(|(name, array)| (name.to_string(), Tag::from_datatype(array.data_type())))
        .collect();
    let converters: Vec<_> = selected
        .iter()
        .map(|(_, array)| ValueConverter::for_datatype(array.data_type()))
        .collect();
    trace!(columns = ?realized, "column types from arrays");

    let opts = FormatOptions::default();
    let formatters = selected
        .iter()
        .map(|&(_, array)| ArrayFormatter::try_new(array.as_ref(), &opts))
        .collect::<Result<Vec<_>, _>>()?;
    let nulls: Vec<_> = selected
        .iter()
        .map(|(_, array)| array.logical_nulls())
        .collect();

    conn.execute(&create_table_sql(table, &realized), [])?;

    begin_inserts(conn)?;

    {
        let mut insert = conn.prepare(&insert_sql(table, realized.len()))?;
        let mut row = Vec::with_capacity(realized.len());
        for row_idx in 0..num_rows {
            row.clear();
            for ((formatter, converter), nulls) in formatters.iter().zip(&converters).zip(&nulls) {
                if nulls.as_ref().is_some_and(|n| n.is_null(row_idx)) {
                    row.push(Value::Null);
                } else {
                    let text = formatter.value(row_idx).to_string();
                    row.push(converter.convert(&text)?);
                }
            }
            insert.execute(params_from_iter(row.iter()))?;
        }
    }

    conn.execute_batch("commit")?;
    debug!(%table, num_rows, "loaded column arrays");

    Ok(realized)
}
