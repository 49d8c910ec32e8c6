use std::sync::Arc;

use arrow::array::{
    ArrayRef,
    BinaryBuilder,
    BooleanArray,
    Float64Array,
    Int64Array,
    NullArray,
    StringBuilder,
};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::DataType;
use rusqlite::types::Value;

use crate::encode;
use crate::errors::{Result, SqlArrayError};
use crate::types::datatype_of_value;

/// Infer a single array type able to hold every value.
///
/// Nulls never influence the result. Integers widen to floats when mixed with
/// reals, and anything mixed with text becomes text. Blobs stay binary only
/// when nothing else (besides nulls) is present.
pub fn infer_datatype<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
    values
        .into_iter()
        .map(datatype_of_value)
        .fold(DataType::Null, |acc, next| match (acc, next) {
            (acc, DataType::Null) => acc,
            (DataType::Null, next) => next,
            (acc, next) if acc == next => acc,
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
                DataType::Float64
            }
            _ => DataType::Utf8,
        })
}

/// Build an array from SQLite values.
///
/// Without an explicit datatype, one is inferred from the values. Boolean,
/// Int64, Float64, Utf8, Binary and Null arrays are built directly with
/// per-value coercion. Any other datatype is produced by building the inferred
/// array first and casting. Casts are checked, values that don't fit produce
/// an error instead of a null.
pub fn values_to_array(values: &[Value], datatype: Option<&DataType>) -> Result<ArrayRef> {
    let inferred = infer_datatype(values);
    let target = datatype.unwrap_or(&inferred);

    if is_directly_buildable(target) {
        return build_array(values, target);
    }

    let array = build_array(values, &inferred)?;
    let opts = CastOptions {
        safe: false,
        ..Default::default()
    };
    Ok(cast_with_options(&array, target, &opts)?)
}

fn is_directly_buildable(datatype: &DataType) -> bool {
    matches!(
        datatype,
        DataType::Null
            | DataType::Boolean
            | DataType::Int64
            | DataType::Float64
            | DataType::Utf8
            | DataType::Binary
    )
}

fn is_null_text(t: &str) -> bool {
    t.is_empty() || t.eq_ignore_ascii_case("null")
}

fn build_array(values: &[Value], datatype: &DataType) -> Result<ArrayRef> {
    let invalid = |v: &Value| SqlArrayError::InvalidConversion {
        from: v.clone(),
        to: datatype.clone(),
    };

    let arr: ArrayRef = match datatype {
        DataType::Null => {
            if let Some(v) = values.iter().find(|v| !matches!(v, Value::Null)) {
                return Err(invalid(v));
            }
            Arc::new(NullArray::new(values.len()))
        }
        DataType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Integer(i) => Ok(Some(*i != 0)),
                    Value::Real(r) => Ok(Some(*r != 0_f64)),
                    Value::Text(t) => {
                        if t.eq_ignore_ascii_case("t")
                            || t.eq_ignore_ascii_case("true")
                            || t.eq_ignore_ascii_case("1")
                        {
                            Ok(Some(true))
                        } else if t.eq_ignore_ascii_case("f")
                            || t.eq_ignore_ascii_case("false")
                            || t.eq_ignore_ascii_case("0")
                        {
                            Ok(Some(false))
                        } else if is_null_text(t) {
                            Ok(None)
                        } else {
                            Err(invalid(v))
                        }
                    }
                    v => Err(invalid(v)),
                })
                .collect::<Result<BooleanArray>>()?,
        ),
        DataType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Integer(i) => Ok(Some(*i)),
                    Value::Real(r) => {
                        if r.trunc() == *r {
                            Ok(Some(*r as i64))
                        } else {
                            Err(invalid(v))
                        }
                    }
                    Value::Text(t) if is_null_text(t) => Ok(None),
                    Value::Text(t) => t.parse::<i64>().map(Some).map_err(|_| invalid(v)),
                    v => Err(invalid(v)),
                })
                .collect::<Result<Int64Array>>()?,
        ),
        DataType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Integer(i) => Ok(Some(*i as f64)),
                    Value::Real(r) => Ok(Some(*r)),
                    Value::Text(t) if is_null_text(t) => Ok(None),
                    Value::Text(t) => t.parse::<f64>().map(Some).map_err(|_| invalid(v)),
                    v => Err(invalid(v)),
                })
                .collect::<Result<Float64Array>>()?,
        ),
        DataType::Utf8 => {
            // Assuming an average length of each string to be 10
            let mut builder = StringBuilder::with_capacity(values.len(), 10 * values.len());
            let mut buf = String::new();
            for v in values {
                match v {
                    Value::Null => builder.append_null(),
                    Value::Text(t) => builder.append_value(t),
                    v => {
                        buf.clear();
                        encode::encode_value(&mut buf, v.into())?;
                        builder.append_value(&buf);
                    }
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Binary => {
            let mut builder = BinaryBuilder::with_capacity(values.len(), 10 * values.len());
            for v in values {
                match v {
                    Value::Null => builder.append_null(),
                    Value::Integer(i) => builder.append_value(i.to_be_bytes()),
                    Value::Real(r) => builder.append_value(r.to_be_bytes()),
                    Value::Text(t) => builder.append_value(t.as_bytes()),
                    Value::Blob(b) => builder.append_value(b),
                }
            }
            Arc::new(builder.finish())
        }
        other => {
            return Err(SqlArrayError::InvalidConversion {
                from: values.first().cloned().unwrap_or(Value::Null),
                to: other.clone(),
            });
        }
    };

    Ok(arr)
}
