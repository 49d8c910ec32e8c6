use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use rusqlite::Connection;
use sqlarray::csv::{CsvReadOptions, CsvWriteOptions, csv_to_table, query_to_csv};
use sqlarray::{
    ColumnMap,
    SqlArrayError,
    TableColumns,
    Tag,
    column_names,
    column_names_and_types,
    columns_to_table,
    query_to_column_arrays,
    query_to_column_map,
    query_to_structured_rows,
    table_names,
    table_schema,
};

fn foo_columns() -> ColumnMap {
    let mut map = ColumnMap::new();
    map.insert("x".to_string(), Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef);
    map.insert("y".to_string(), Arc::new(Float64Array::from(vec![3.3, 2.2, 1.1])) as ArrayRef);
    map.insert("z".to_string(), Arc::new(StringArray::from(vec!["a", "b", "c"])) as ArrayRef);
    map
}

fn setup() -> Connection {
    logutil::init_test();

    let conn = Connection::open_in_memory().unwrap();
    let map = foo_columns();
    let header = vec!["x".to_string(), "y".to_string(), "z".to_string()];
    columns_to_table(&conn, "foo", TableColumns::Named {
        columns: &map,
        header: &header,
    })
    .unwrap();
    conn
}

#[test]
fn arity_agrees_across_entry_points() {
    let conn = setup();
    for query in [
        "select * from foo",
        "select x from foo",
        "select x, z from foo",
        "select x, x from foo",
    ] {
        let names = column_names(&conn, query).unwrap();
        let typed = column_names_and_types(&conn, query).unwrap();
        let arrays = query_to_column_arrays(&conn, query, None).unwrap();
        assert_eq!(names.len(), typed.len(), "query: {query}");
        assert_eq!(names.len(), arrays.len(), "query: {query}");
    }
}

#[test]
fn columns_round_trip() {
    let conn = setup();
    let arrays = query_to_column_arrays(&conn, "select * from foo order by x", None).unwrap();

    let source = foo_columns();
    for (array, (name, expected)) in arrays.iter().zip(&source) {
        assert_eq!(expected.as_ref(), array.as_ref(), "column: {name}");
        assert_eq!(
            Tag::from_datatype(expected.data_type()),
            Tag::from_datatype(array.data_type())
        );
    }

    let tables = table_names(&conn).unwrap();
    assert_eq!(vec!["foo"], tables);
}

#[test]
fn duplicate_names_list_vs_map() {
    let conn = setup();
    let list = query_to_column_arrays(&conn, "select x, x from foo order by x", None).unwrap();
    let map = query_to_column_map(&conn, "select x, x from foo order by x", None).unwrap();

    assert_eq!(2, list.len());
    assert_eq!(1, map.len());
    assert_eq!(list[0].as_ref(), list[1].as_ref());
    assert_eq!(list[1].as_ref(), map["x"].as_ref());
}

#[test]
fn mismatched_dtypes_fail_early() {
    let conn = setup();
    let dtypes = [Some(DataType::Int64)];
    let err = query_to_column_arrays(&conn, "select x, y, z from foo", Some(&dtypes)).unwrap_err();
    assert!(matches!(
        err,
        SqlArrayError::TypeCountMismatch {
            expected: 1,
            actual: 3
        }
    ));
}

#[test]
fn structured_rows_cast_fields() {
    let conn = setup();
    let dtypes = [DataType::Int32, DataType::Float32, DataType::Utf8];
    let rows = query_to_structured_rows(&conn, "select * from foo order by x", &dtypes).unwrap();
    assert_eq!(3, rows.len());

    let x = rows.column(0).as_primitive::<Int32Type>();
    let y = rows.column(1).as_primitive::<Float32Type>();
    let z = rows.column(2).as_string::<i32>();
    let expected = [(1, 3.3_f32, "a"), (2, 2.2_f32, "b"), (3, 1.1_f32, "c")];
    for (idx, (ex, ey, ez)) in expected.into_iter().enumerate() {
        assert_eq!(ex, x.value(idx));
        assert_eq!(ey, y.value(idx));
        assert_eq!(ez, z.value(idx));
    }
}

#[test]
fn csv_export_then_load_round_trip() {
    let conn = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.csv");

    query_to_csv(&conn, "select * from foo order by x", &path, &CsvWriteOptions::default()).unwrap();
    let cols = csv_to_table(&conn, "a", &path, &CsvReadOptions::default()).unwrap();

    let expected = vec![
        ("x".to_string(), Tag::Int),
        ("y".to_string(), Tag::Real),
        ("z".to_string(), Tag::String),
    ];
    assert_eq!(expected, cols);

    let schema = table_schema(&conn, "a").unwrap();
    let as_tags: Vec<_> = cols.iter().map(|(n, t)| (n.clone(), t.to_string())).collect();
    assert_eq!(as_tags, schema);

    let arrays = query_to_column_arrays(&conn, "select * from a order by x", None).unwrap();
    assert_eq!(&Int64Array::from(vec![1, 2, 3]), arrays[0].as_primitive::<Int64Type>());
    assert_eq!(&Float64Array::from(vec![3.3, 2.2, 1.1]), arrays[1].as_primitive::<Float64Type>());
}

#[test]
fn csv_export_header_toggle() {
    let conn = setup();
    let dir = tempfile::tempdir().unwrap();
    let with_header = dir.path().join("three.csv");
    let without_header = dir.path().join("threenoh.csv");
    let query = "select z, z, z from foo order by z desc";

    query_to_csv(&conn, query, &with_header, &CsvWriteOptions::default()).unwrap();
    let opts = CsvWriteOptions {
        skip_header: true,
        ..Default::default()
    };
    query_to_csv(&conn, query, &without_header, &opts).unwrap();

    let with_header = std::fs::read_to_string(with_header).unwrap();
    let without_header = std::fs::read_to_string(without_header).unwrap();

    assert_eq!("z,z,z\r\nc,c,c\r\nb,b,b\r\na,a,a\r\n", with_header);
    assert_eq!(with_header.strip_prefix("z,z,z\r\n").unwrap(), without_header);
}

#[test]
fn csv_load_without_header_record() {
    let conn = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twonoh.csv");

    let opts = CsvWriteOptions {
        skip_header: true,
        ..Default::default()
    };
    query_to_csv(&conn, "select z, y, x from foo order by z", &path, &opts).unwrap();

    let opts = CsvReadOptions {
        skip_header: true,
        header: Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
        ..Default::default()
    };
    let cols = csv_to_table(&conn, "d", &path, &opts).unwrap();
    assert_eq!(
        vec![
            ("a".to_string(), Tag::String),
            ("b".to_string(), Tag::Real),
            ("c".to_string(), Tag::Int),
        ],
        cols
    );

    let count: i64 = conn.query_row("select count(*) from d", [], |r| r.get(0)).unwrap();
    assert_eq!(3, count);
}
