//! Canonical CBOR form for values and rows.
//!
//! The canonical form is what the storage engine persists and what the
//! query merger hashes to recognise identical rows fetched through
//! different index scans. Two values with equal content always produce the
//! same bytes:
//!
//! - Map fields are sorted by name (length-first, then bytewise)
//! - Floats with an exact integral value in the `i64` range become integers
//! - NaN is rejected
//! - Integers use the shortest encoding (ciborium)

use crate::error::{CodecError, CodecResult};
use crate::row::Row;
use crate::value::{sorted_fields, Value};

/// Lower bound (inclusive) of floats that fit in `i64`.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
/// Upper bound (exclusive) of floats that fit in `i64`.
const I64_MAX_F: f64 = 9_223_372_036_854_775_808.0;

/// Encodes a value to its canonical CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::NaNForbidden`] if the value contains NaN, or an
/// encoding error from ciborium.
pub fn to_canonical_bytes(value: &Value) -> CodecResult<Vec<u8>> {
    let normalized = normalize(value)?;
    let mut out = Vec::new();
    ciborium::into_writer(&normalized, &mut out)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(out)
}

/// Decodes a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR or use non-text map keys.
pub fn from_canonical_bytes(bytes: &[u8]) -> CodecResult<Value> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Encodes a row to its canonical CBOR bytes.
///
/// # Errors
///
/// See [`to_canonical_bytes`].
pub fn encode_row(row: &Row) -> CodecResult<Vec<u8>> {
    to_canonical_bytes(&Value::Map(row.as_slice().to_vec()))
}

/// Decodes a row previously written by [`encode_row`].
///
/// # Errors
///
/// Returns an error if the bytes do not decode to a map.
pub fn decode_row(bytes: &[u8]) -> CodecResult<Row> {
    Row::try_from(from_canonical_bytes(bytes)?)
}

fn normalize(value: &Value) -> CodecResult<Value> {
    Ok(match value {
        Value::Float(f) if f.is_nan() => return Err(CodecError::NaNForbidden),
        Value::Float(f) => integral(*f).map_or(Value::Float(*f), Value::Integer),
        Value::Array(items) => {
            Value::Array(items.iter().map(normalize).collect::<CodecResult<_>>()?)
        }
        Value::Map(fields) => Value::Map(
            sorted_fields(fields)
                .into_iter()
                .map(|(name, v)| Ok((name.clone(), normalize(v)?)))
                .collect::<CodecResult<_>>()?,
        ),
        other => other.clone(),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (I64_MIN_F..I64_MAX_F).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_does_not_change_bytes() {
        let a = Row::new().with("id", 1).with("name", "Ada").with("age", 36);
        let b = Row::new().with("age", 36).with("id", 1).with("name", "Ada");
        assert_eq!(encode_row(&a).unwrap(), encode_row(&b).unwrap());
    }

    #[test]
    fn integral_floats_encode_as_integers() {
        let float = to_canonical_bytes(&Value::Float(42.0)).unwrap();
        let int = to_canonical_bytes(&Value::Integer(42)).unwrap();
        assert_eq!(float, int);

        let neg_zero = to_canonical_bytes(&Value::Float(-0.0)).unwrap();
        assert_eq!(neg_zero, to_canonical_bytes(&Value::Integer(0)).unwrap());
    }

    #[test]
    fn fractional_floats_survive() {
        let bytes = to_canonical_bytes(&Value::Float(2.5)).unwrap();
        assert_eq!(from_canonical_bytes(&bytes).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn nan_is_rejected() {
        let row = Row::new().with("id", 1).with("score", f64::NAN);
        assert_eq!(encode_row(&row), Err(CodecError::NaNForbidden));
    }

    #[test]
    fn shortest_integer_encoding() {
        assert_eq!(to_canonical_bytes(&Value::Integer(23)).unwrap(), vec![0x17]);
        assert_eq!(to_canonical_bytes(&Value::Integer(24)).unwrap(), vec![0x18, 24]);
        assert_eq!(to_canonical_bytes(&Value::Integer(-1)).unwrap(), vec![0x20]);
    }

    #[test]
    fn decoded_row_is_independent_copy() {
        let original = Row::new()
            .with("id", 7)
            .with("tags", Value::Array(vec![Value::from("x")]))
            .with("blob", vec![1u8, 2, 3]);
        let bytes = encode_row(&original).unwrap();

        let mut copy = decode_row(&bytes).unwrap();
        assert_eq!(copy, original);

        copy.set("id", 8);
        assert_eq!(decode_row(&bytes).unwrap().get("id"), Some(&Value::Integer(7)));
    }

    #[test]
    fn decode_rejects_non_map_rows() {
        let bytes = to_canonical_bytes(&Value::Integer(1)).unwrap();
        assert!(decode_row(&bytes).is_err());
    }
}
