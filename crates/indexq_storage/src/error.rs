//! Error types for storage engine operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine handle has been closed.
    #[error("storage engine is closed")]
    Closed,

    /// A version upgrade could not start because other handles are open.
    #[error("store {name} is blocked by another open connection")]
    Blocked {
        /// Name of the store.
        name: String,
    },

    /// The requested version is older than the stored one.
    #[error("store {name} is at version {current}, cannot open at version {requested}")]
    VersionMismatch {
        /// Name of the store.
        name: String,
        /// Version asked for.
        requested: u32,
        /// Version on record.
        current: u32,
    },

    /// Versions start at 1.
    #[error("invalid store version {0}")]
    InvalidVersion(u32),

    /// The table does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// Name of the table.
        table: String,
    },

    /// The index does not exist on the table.
    #[error("index {index} not found on table {table}")]
    IndexNotFound {
        /// Name of the table.
        table: String,
        /// Name of the index.
        index: String,
    },

    /// A table or index with this name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The row's primary key is missing or not a valid key.
    #[error("invalid key for table {table}: {message}")]
    InvalidKey {
        /// Name of the table.
        table: String,
        /// What is wrong with the key.
        message: String,
    },

    /// A key or unique index collision.
    #[error("constraint violated on table {table}: {message}")]
    Constraint {
        /// Name of the table.
        table: String,
        /// Which constraint and value.
        message: String,
    },

    /// A write was attempted in a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// A row could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] indexq_codec::CodecError),
}

impl StorageError {
    /// Creates a table not found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a constraint error.
    pub fn constraint(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            table: table.into(),
            message: message.into(),
        }
    }
}
