//! Connection configuration.

/// What `select` and `delete` do with a query that has no clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQuery {
    /// Match every row of the table.
    AllRows,
    /// Fail with [`crate::CoreError::InvalidQuery`].
    Reject,
}

/// Configuration for opening a connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store version passed to the engine. Raising it runs the schema
    /// upgrade, which creates any tables and indexes the engine lacks.
    pub version: u32,

    /// Handling of queries with no clauses.
    pub empty_query: EmptyQuery,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            empty_query: EmptyQuery::AllRows,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store version.
    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the handling of empty queries.
    #[must_use]
    pub const fn empty_query(mut self, policy: EmptyQuery) -> Self {
        self.empty_query = policy;
        self
    }
}
