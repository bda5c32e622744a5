//! Benchmark support for IndexQ.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
