//! Storage engine contract.
//!
//! IndexQ does not store anything itself. It drives a host engine that
//! provides object stores keyed by a primary key, named secondary indexes
//! with range scans, and atomic transactions. These traits describe exactly
//! what the query layer needs from such an engine.

use crate::error::StorageResult;
use crate::range::KeyRange;
use indexq_codec::{Row, Value};

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Reads only. Any number may be open at once.
    ReadOnly,
    /// Reads and writes. The engine runs one at a time.
    ReadWrite,
}

/// How a row write treats an existing row with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Insert or overwrite.
    Put,
    /// Insert only; an existing key is a constraint error.
    Insert,
}

/// Options of a secondary index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// At most one row per index key.
    pub unique: bool,
    /// Array values index each element instead of the whole array.
    pub multi_entry: bool,
    /// Collation locale hint. Recorded, not interpreted by the memory engine.
    pub locale: Option<String>,
}

/// Schema changes available while a store is being upgraded.
///
/// An upgrade runs when a store is opened at a newer version than the one on
/// record. Changes apply atomically: if the callback fails, none are kept.
pub trait SchemaUpgrade {
    /// Version on record before the upgrade (0 for a new store).
    fn old_version(&self) -> u32;

    /// Version being opened.
    fn new_version(&self) -> u32;

    /// Returns true if the table exists.
    fn has_table(&self, table: &str) -> bool;

    /// Returns the options of the table's index on `field`, if it has one.
    fn index_options(&self, table: &str, field: &str) -> Option<IndexOptions>;

    /// Returns true if the table has an index on `field`.
    fn has_index(&self, table: &str, field: &str) -> bool {
        self.index_options(table, field).is_some()
    }

    /// Creates a table keyed by `key_field`.
    ///
    /// # Errors
    ///
    /// Fails if the table already exists.
    fn create_table(&mut self, table: &str, key_field: &str, auto_increment: bool)
        -> StorageResult<()>;

    /// Creates a secondary index on `field`, populated from existing rows.
    ///
    /// # Errors
    ///
    /// Fails if the table is missing, the index exists, or existing rows
    /// violate a unique index.
    fn create_index(
        &mut self,
        table: &str,
        field: &str,
        options: &IndexOptions,
    ) -> StorageResult<()>;
}

/// Opens named, versioned stores.
#[allow(async_fn_in_trait)]
pub trait StoreFactory: Send + Sync {
    /// Engine handle type.
    type Engine: StorageEngine;

    /// Opens the store `name` at `version`, running `upgrade` first when the
    /// version on record is older.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is older than the one on record, if
    /// other handles block the upgrade, or if `upgrade` fails.
    async fn open_store<F>(
        &self,
        name: &str,
        version: u32,
        upgrade: F,
    ) -> StorageResult<Self::Engine>
    where
        F: FnOnce(&mut dyn SchemaUpgrade) -> StorageResult<()> + Send;
}

/// An open store.
#[allow(async_fn_in_trait)]
pub trait StorageEngine: Send + Sync {
    /// Transaction type.
    type Transaction: Transaction;

    /// Name of the store.
    fn name(&self) -> &str;

    /// Version the store was opened at.
    fn version(&self) -> u32;

    /// Starts a transaction. Read-write transactions wait for the current
    /// writer to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed.
    async fn begin(&self, mode: TransactionMode) -> StorageResult<Self::Transaction>;

    /// Closes the handle. Further `begin` calls fail.
    fn close(&self);
}

/// A transaction over one store.
///
/// Rows returned by scans are fresh copies. Dropping a read-write
/// transaction without calling [`Transaction::commit`] discards its writes.
#[allow(async_fn_in_trait)]
pub trait Transaction: Send + Sync {
    /// Returns all rows whose `field` index key lies in `range`, in index
    /// order.
    ///
    /// # Errors
    ///
    /// Fails if the table or index does not exist.
    async fn scan_index(
        &self,
        table: &str,
        field: &str,
        range: &KeyRange,
    ) -> StorageResult<Vec<Row>>;

    /// Returns rows by primary key, all of them when `range` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if the table does not exist.
    async fn scan_primary(&self, table: &str, range: Option<&KeyRange>) -> StorageResult<Vec<Row>>;

    /// Writes a row and returns its primary key.
    ///
    /// # Errors
    ///
    /// Fails on a read-only transaction, a missing or invalid key, a key
    /// collision in [`WriteMode::Insert`], or a unique index violation.
    async fn write_row(&mut self, table: &str, row: Row, mode: WriteMode) -> StorageResult<Value>;

    /// Deletes the row with primary key `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Fails on a read-only transaction or a missing table.
    async fn delete_row(&mut self, table: &str, key: &Value) -> StorageResult<()>;

    /// Commits the transaction's writes atomically.
    ///
    /// # Errors
    ///
    /// Fails if the engine was closed while the transaction was open.
    async fn commit(self) -> StorageResult<()>;
}
