//! Move tabular data between SQLite, Arrow column arrays and delimited text.
//!
//! Query results can be materialized as one array per column, a name keyed
//! map of arrays, a single matrix with one element type, or an array of
//! records. In the other direction, column arrays and delimited text files can
//! be loaded into new tables with column types inferred from the data.
//!
//! Type inference for text and arrays shares the same three way
//! classification, [`Tag`], which is also what gets declared on created
//! tables. Reading the schema back with [`table_schema`] yields the same
//! names.

pub mod csv;
pub mod encode;
pub mod errors;

mod convert;
mod introspect;
mod materialize;
mod schema;
mod types;

pub use convert::{infer_datatype, values_to_array};
pub use errors::{Result, SqlArrayError};
pub use introspect::{ProbedQuery, column_names, column_names_and_types};
pub use materialize::{
    ColumnMap,
    Matrix,
    query_to_column_arrays,
    query_to_column_map,
    query_to_matrix,
    query_to_structured_rows,
};
pub use schema::{
    TableColumns,
    TextHeader,
    columns_to_table,
    table_names,
    table_schema,
    text_rows_to_table,
};
pub use types::{Tag, ValueConverter, datatype_of_value};
