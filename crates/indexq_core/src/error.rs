//! Error types for IndexQ core.

use indexq_codec::{CodecError, Value};
use indexq_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in IndexQ core operations.
///
/// Validation errors (`NotInitialized`, `MissingTable`, `UnknownColumn`,
/// `InvalidRow`, `InvalidQuery`) are raised before the storage engine is
/// touched. Engine failures are wrapped with the table and the clause or key
/// involved.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The connection was closed, or never opened its store.
    #[error("connection is not initialized")]
    NotInitialized,

    /// The table is not part of the database schema.
    #[error("table not found in schema: {table}")]
    MissingTable {
        /// Name of the table.
        table: String,
    },

    /// The field has no index on the table.
    #[error("table {table} has no index on field {field}")]
    UnknownColumn {
        /// Name of the table.
        table: String,
        /// The field that was queried.
        field: String,
    },

    /// The schema descriptors are malformed.
    #[error("invalid schema: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The store could not be opened.
    #[error("cannot open store {name}: {source}")]
    Connection {
        /// Name of the store.
        name: String,
        /// Engine failure.
        #[source]
        source: StorageError,
    },

    /// A row cannot be written to the table.
    #[error("invalid row for table {table}: {message}")]
    InvalidRow {
        /// Name of the table.
        table: String,
        /// Description of the problem.
        message: String,
    },

    /// A query was rejected before any scan.
    #[error("invalid query on table {table}: {message}")]
    InvalidQuery {
        /// Name of the table.
        table: String,
        /// Description of the problem.
        message: String,
    },

    /// A transaction could not be started or committed.
    #[error("transaction on table {table} failed: {source}")]
    Transaction {
        /// Name of the table.
        table: String,
        /// Engine failure.
        #[source]
        source: StorageError,
    },

    /// An index scan failed.
    #[error("scan of table {table} failed for clause {clause}: {source}")]
    Scan {
        /// Name of the table.
        table: String,
        /// The clause being scanned.
        clause: String,
        /// Engine failure.
        #[source]
        source: StorageError,
    },

    /// The engine rejected a row write.
    #[error("write to table {table} failed for key {key:?}: {source}")]
    Write {
        /// Name of the table.
        table: String,
        /// Key of the row, if it had one before the write.
        key: Option<Value>,
        /// Engine failure.
        #[source]
        source: StorageError,
    },

    /// The engine rejected a row delete.
    #[error("delete from table {table} failed for key {key:?}: {source}")]
    Delete {
        /// Name of the table.
        table: String,
        /// Key of the row.
        key: Value,
        /// Engine failure.
        #[source]
        source: StorageError,
    },

    /// Some items of a multi-row operation failed. The others were applied.
    #[error("{failed} of {total} operations on table {table} failed", failed = .failures.len())]
    Batch {
        /// Name of the table.
        table: String,
        /// Number of items attempted.
        total: usize,
        /// Every failed item, in input order.
        failures: Vec<ItemFailure>,
    },

    /// A row could not be normalized for comparison.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// One failed item of a multi-row operation.
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the item in the operation's input.
    pub index: usize,
    /// Why it failed.
    pub error: CoreError,
}

impl CoreError {
    /// Creates a missing table error.
    pub fn missing_table(table: impl Into<String>) -> Self {
        Self::MissingTable {
            table: table.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid row error.
    pub fn invalid_row(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            table: table.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_table_and_field() {
        let err = CoreError::unknown_column("People", "nickname");
        assert_eq!(err.to_string(), "table People has no index on field nickname");

        let err = CoreError::missing_table("NoSuchTable");
        assert_eq!(err.to_string(), "table not found in schema: NoSuchTable");
    }

    #[test]
    fn batch_message_counts_failures() {
        let err = CoreError::Batch {
            table: "People".into(),
            total: 3,
            failures: vec![ItemFailure {
                index: 1,
                error: CoreError::invalid_row("People", "row has no id field"),
            }],
        };
        assert_eq!(err.to_string(), "1 of 3 operations on table People failed");
    }
}
