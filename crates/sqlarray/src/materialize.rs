//! Reshape query results into column arrays.
//!
//! Every entry point executes the query, validates the first row against any
//! caller provided types, then drains the cursor completely. Results are held
//! in memory in full.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, StructArray, UInt64Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Fields};
use indexmap::IndexMap;
use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, trace};

use crate::convert::values_to_array;
use crate::errors::{Result, SqlArrayError};
use crate::introspect::ProbedQuery;

/// Column arrays keyed by column name.
pub type ColumnMap = IndexMap<String, ArrayRef>;

/// Execute a query and return one array per output column, in output order.
///
/// `dtypes` provides an optional type for each column. A `None` entry (or no
/// `dtypes` at all) infers the type from the column's values.
pub fn query_to_column_arrays(
    conn: &Connection,
    query: &str,
    dtypes: Option<&[Option<DataType>]>,
) -> Result<Vec<ArrayRef>> {
    let (_names, arrays) = query_columns(conn, query, dtypes)?;
    Ok(arrays)
}

/// Execute a query and return column arrays keyed by name.
///
/// Columns are inserted in output order and a repeated name overwrites the
/// previous entry, so only the right-most column with a given name is kept.
/// The entry keeps the map position of the first occurrence. Alias the column
/// in the query (`select x, x as y ...`) to keep both.
pub fn query_to_column_map(
    conn: &Connection,
    query: &str,
    dtypes: Option<&[Option<DataType>]>,
) -> Result<ColumnMap> {
    let (names, arrays) = query_columns(conn, query, dtypes)?;

    let mut map = ColumnMap::with_capacity(names.len());
    for (name, array) in names.into_iter().zip(arrays) {
        map.insert(name, array);
    }

    Ok(map)
}

fn query_columns(
    conn: &Connection,
    query: &str,
    dtypes: Option<&[Option<DataType>]>,
) -> Result<(Vec<String>, Vec<ArrayRef>)> {
    debug!(%query, "querying into column arrays");

    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, dtypes.map(|d| d.len()))?;
    let (names, columns) = probed.into_columns()?;

    let arrays = columns
        .iter()
        .enumerate()
        .map(|(idx, values)| {
            let dtype = dtypes.and_then(|d| d[idx].as_ref());
            values_to_array(values, dtype)
        })
        .collect::<Result<Vec<_>>>()?;

    trace!(types = ?arrays.iter().map(|a| a.data_type()).collect::<Vec<_>>(), "built column arrays");

    Ok((names, arrays))
}

/// A two dimensional array with a single element type.
///
/// Values are stored row-major in a single flat array.
#[derive(Debug, Clone)]
pub struct Matrix {
    num_rows: usize,
    num_columns: usize,
    values: ArrayRef,
}

impl Matrix {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_columns)
    }

    pub fn datatype(&self) -> &DataType {
        self.values.data_type()
    }

    /// The flat row-major values.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Get a row as a zero-copy slice.
    pub fn row(&self, idx: usize) -> Result<ArrayRef> {
        if idx >= self.num_rows {
            return Err(SqlArrayError::ShapeMismatch {
                index: idx,
                len: self.num_rows,
            });
        }
        Ok(self.values.slice(idx * self.num_columns, self.num_columns))
    }

    /// Gather a column into a new array.
    pub fn column(&self, idx: usize) -> Result<ArrayRef> {
        if idx >= self.num_columns {
            return Err(SqlArrayError::ShapeMismatch {
                index: idx,
                len: self.num_columns,
            });
        }
        let indices: UInt64Array = (0..self.num_rows)
            .map(|row| (row * self.num_columns + idx) as u64)
            .collect();
        Ok(take(self.values.as_ref(), &indices, None)?)
    }
}

/// Execute a query and return the result as a matrix with a single element
/// type.
///
/// Without `dtype` the element type is inferred over every value in the
/// result, so a single text column turns the whole matrix into text.
pub fn query_to_matrix(conn: &Connection, query: &str, dtype: Option<&DataType>) -> Result<Matrix> {
    debug!(%query, "querying into matrix");

    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, None)?;
    let num_columns = probed.num_columns();
    let (_names, rows) = probed.into_rows()?;

    let num_rows = rows.len();
    let flat: Vec<Value> = rows.into_iter().flatten().collect();
    let values = values_to_array(&flat, dtype)?;

    Ok(Matrix {
        num_rows,
        num_columns,
        values,
    })
}

/// Execute a query and return a single array of records.
///
/// The record layout pairs each column name with the type at the same
/// position in `dtypes`. Types are never inferred here. Column names must be
/// unique.
pub fn query_to_structured_rows(
    conn: &Connection,
    query: &str,
    dtypes: &[DataType],
) -> Result<StructArray> {
    debug!(%query, "querying into structured rows");

    let mut stmt = conn.prepare(query)?;
    let probed = ProbedQuery::try_new(&mut stmt, Some(dtypes.len()))?;

    let mut seen = HashSet::with_capacity(dtypes.len());
    for name in probed.names() {
        if !seen.insert(name.as_str()) {
            return Err(SqlArrayError::DuplicateFieldName(name.clone()));
        }
    }

    let (names, columns) = probed.into_columns()?;

    let fields: Fields = names
        .iter()
        .zip(dtypes)
        .map(|(name, dtype)| Field::new(name, dtype.clone(), true))
        .collect();

    let arrays = columns
        .iter()
        .zip(dtypes)
        .map(|(values, dtype)| values_to_array(values, Some(dtype)))
        .collect::<Result<Vec<_>>>()?;

    Ok(StructArray::try_new(fields, arrays, None)?)
}
