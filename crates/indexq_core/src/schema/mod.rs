//! Schema descriptors.
//!
//! A [`Database`] lists the [`Table`]s of a store. Each table names its
//! primary key field and the [`Column`]s that get a secondary index. The
//! descriptors are built once, handed to [`crate::Connection::open`], and
//! never mutated afterwards.

mod column;
mod database;
mod table;

pub use column::{Column, ColumnOptions};
pub use database::Database;
pub use table::{IndexTarget, Table, TableBuilder};
