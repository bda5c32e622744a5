//! # IndexQ Codec
//!
//! Row values and their canonical encoding for IndexQ.
//!
//! This crate provides:
//! - [`Value`], the dynamic field value, with index key ordering
//! - [`Row`], an ordered field map with order-insensitive equality
//! - Canonical CBOR encoding, used as the stored row format and as the
//!   content key when merging query results
//!
//! ## Usage
//!
//! ```
//! use indexq_codec::{decode_row, encode_row, Row, Value};
//!
//! let row = Row::new().with("id", 1).with("name", "Ada");
//! let bytes = encode_row(&row).unwrap();
//!
//! let decoded = decode_row(&bytes).unwrap();
//! assert_eq!(decoded.get("name"), Some(&Value::from("Ada")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod canonical;
mod error;
mod row;
mod serialize;
mod value;

pub use canonical::{decode_row, encode_row, from_canonical_bytes, to_canonical_bytes};
pub use error::{CodecError, CodecResult};
pub use row::Row;
pub use value::Value;
