//! Text rendering of SQLite values.
//!
//! Used when a column is coerced to a string array and when writing query
//! results out as delimited text.

use std::fmt::Write;

use rusqlite::types::{Value, ValueRef};

use crate::errors::Result;

/// Encode integral value as a string.
pub fn encode_int<B: Write>(buf: &mut B, v: i64) -> Result<()> {
    write!(buf, "{v}")?;
    Ok(())
}

/// Encode floating point value as a string.
///
/// Output is the shortest representation that parses back to the same value.
/// Whole numbers keep their trailing ".0" so the text still reads as a real.
pub fn encode_float<B: Write>(buf: &mut B, v: f64) -> Result<()> {
    if v.is_nan() {
        buf.write_str("NaN")?;
        return Ok(());
    }

    if v.is_infinite() {
        if v.is_sign_negative() {
            buf.write_str("-Infinity")?;
        } else {
            buf.write_str("Infinity")?;
        }
        return Ok(());
    }

    let mut dtoa_buf = dtoa::Buffer::new();
    let v = dtoa_buf.format_finite(v);

    let mut iter = v.chars().peekable();
    while let Some(c) = iter.next() {
        buf.write_char(c)?;

        // Exponents always carry a sign, "1e+21" and "1e-9".
        if c == 'e' && iter.peek() != Some(&'-') {
            buf.write_char('+')?;
        }
    }

    Ok(())
}

/// Encode a binary value as a hex string prefixed by "\x".
pub fn encode_binary<B: Write>(buf: &mut B, v: &[u8]) -> Result<()> {
    buf.write_str("\\x")?;
    for b in v {
        write!(buf, "{b:02x}")?;
    }
    Ok(())
}

/// Encode any SQLite value. NULL encodes to the empty string.
pub fn encode_value<B: Write>(buf: &mut B, v: ValueRef<'_>) -> Result<()> {
    match v {
        ValueRef::Null => Ok(()),
        ValueRef::Integer(i) => encode_int(buf, i),
        ValueRef::Real(r) => encode_float(buf, r),
        ValueRef::Text(t) => {
            buf.write_str(&String::from_utf8_lossy(t))?;
            Ok(())
        }
        ValueRef::Blob(b) => encode_binary(buf, b),
    }
}

/// Convenience for encoding an owned value into a fresh string.
pub fn value_to_string(v: &Value) -> Result<String> {
    let mut s = String::new();
    encode_value(&mut s, ValueRef::from(v))?;
    Ok(s)
}
