use arrow::datatypes::DataType;
use rusqlite::types::Value;
use rusqlite::{Connection, Rows, Statement};
use tracing::trace;

use crate::errors::{Result, SqlArrayError};
use crate::types::datatype_of_value;

/// A query that has been executed and had its first row fetched.
///
/// The remaining rows are still pending on the underlying cursor.
pub struct ProbedQuery<'stmt> {
    names: Vec<String>,
    first_row: Option<Vec<Value>>,
    rows: Rows<'stmt>,
}

impl<'stmt> ProbedQuery<'stmt> {
    /// Execute the statement and fetch a single row.
    ///
    /// Errors if the query produces no rows. If `expected_types` is provided,
    /// it must match the number of columns in the result.
    pub fn try_new(stmt: &'stmt mut Statement<'_>, expected_types: Option<usize>) -> Result<Self> {
        // Names in output order, duplicates included.
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let first_row = match rows.next()? {
            Some(row) => read_row(row, names.len())?,
            None => return Err(SqlArrayError::EmptyResult),
        };

        if let Some(expected) = expected_types {
            if expected != first_row.len() {
                return Err(SqlArrayError::TypeCountMismatch {
                    expected,
                    actual: first_row.len(),
                });
            }
        }

        trace!(?names, "probed query");

        Ok(ProbedQuery {
            names,
            first_row: Some(first_row),
            rows,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_columns(&self) -> usize {
        self.names.len()
    }

    /// The first fetched row, if it hasn't been consumed yet.
    pub fn first_row(&self) -> Option<&[Value]> {
        self.first_row.as_deref()
    }

    /// Get the next row, starting with the probed first row.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if let Some(row) = self.first_row.take() {
            return Ok(Some(row));
        }
        match self.rows.next()? {
            Some(row) => Ok(Some(read_row(row, self.names.len())?)),
            None => Ok(None),
        }
    }

    /// Drain all rows into column-major buffers.
    pub fn into_columns(mut self) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); self.num_columns()];
        while let Some(row) = self.next_row()? {
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        trace!(num_rows = columns.first().map(|c| c.len()), "drained query into columns");
        Ok((self.names, columns))
    }

    /// Drain all rows, keeping them row-major.
    pub fn into_rows(mut self) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        trace!(num_rows = rows.len(), "drained query into rows");
        Ok((self.names, rows))
    }
}

fn read_row(row: &rusqlite::Row<'_>, num_cols: usize) -> Result<Vec<Value>> {
    (0..num_cols)
        .map(|idx| -> Result<Value> { Ok(Value::from(row.get_ref(idx)?)) })
        .collect()
}

/// Names of the columns a query produces.
///
/// The query must produce at least one row.
pub fn column_names(conn: &Connection, query: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, None)?;
    Ok(probed.names)
}

/// Names of the columns a query produces alongside the array type of the
/// value in the first row.
pub fn column_names_and_types(conn: &Connection, query: &str) -> Result<Vec<(String, DataType)>> {
    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, None)?;
    let types: Vec<_> = probed
        .first_row()
        .unwrap_or_default()
        .iter()
        .map(datatype_of_value)
        .collect();

    Ok(probed.names.into_iter().zip(types).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "create table bar (z string, x int);
             insert into bar values ('a', 1), ('b', 2), ('c', 3);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn names_in_output_order() {
        let conn = test_conn();
        assert_eq!(vec!["z", "x"], column_names(&conn, "select * from bar").unwrap());
        assert_eq!(vec!["x", "z"], column_names(&conn, "select x, z from bar").unwrap());
        assert_eq!(vec!["x", "x"], column_names(&conn, "select x, x from bar").unwrap());
    }

    #[test]
    fn names_and_types() {
        let conn = test_conn();
        let got = column_names_and_types(&conn, "select x, z, 1.5 as y, null as n from bar").unwrap();
        let expected = vec![
            ("x".to_string(), DataType::Int64),
            ("z".to_string(), DataType::Utf8),
            ("y".to_string(), DataType::Float64),
            ("n".to_string(), DataType::Null),
        ];
        assert_eq!(expected, got);
    }

    #[test]
    fn empty_result() {
        let conn = test_conn();
        let err = column_names(&conn, "select * from bar where x > 10").unwrap_err();
        assert!(matches!(err, SqlArrayError::EmptyResult));
    }

    #[test]
    fn type_count_mismatch() {
        let conn = test_conn();
        let mut stmt = conn.prepare("select x, x, z from bar").unwrap();
        let err = ProbedQuery::try_new(&mut stmt, Some(2)).err().unwrap();
        assert!(matches!(
            err,
            SqlArrayError::TypeCountMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn first_row_returned_once() {
        let conn = test_conn();
        let mut stmt = conn.prepare("select x from bar order by x").unwrap();
        let mut probed = ProbedQuery::try_new(&mut stmt, Some(1)).unwrap();
        assert_eq!(Some(&[Value::Integer(1)][..]), probed.first_row());

        let mut seen = Vec::new();
        while let Some(row) = probed.next_row().unwrap() {
            seen.push(row);
        }
        assert_eq!(
            vec![
                vec![Value::Integer(1)],
                vec![Value::Integer(2)],
                vec![Value::Integer(3)]
            ],
            seen
        );
    }
}
