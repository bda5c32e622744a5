//! # IndexQ Core
//!
//! Declarative queries over a key-value store with secondary indexes.
//!
//! This crate provides:
//! - Schema descriptors for tables, their key and their indexed columns
//! - A predicate parser that collapses per-field operators into index ranges
//! - A scan executor that runs one index scan per clause in a shared read
//!   transaction
//! - A merger that intersects and subtracts row batches by content
//! - Row writes and query-driven deletes through a [`Connection`]
//!
//! Storage is delegated to any engine implementing the
//! [`indexq_storage`] traits.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod error;
mod mutation;
pub mod query;
pub mod schema;

pub use config::{Config, EmptyQuery};
pub use connection::{Connection, MemoryConnection};
pub use error::{CoreError, CoreResult, ItemFailure};
pub use mutation::AddOptions;
pub use query::{Condition, Operators, Query};
pub use schema::{Column, ColumnOptions, Database, Table};
