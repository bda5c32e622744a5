//! Column descriptors.

use indexq_storage::IndexOptions;

/// Options of the secondary index behind a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    /// At most one row may hold each value.
    pub unique: bool,
    /// An array value indexes each of its elements.
    pub multi_entry: bool,
    /// Collation locale passed to the engine.
    pub locale: Option<String>,
}

impl ColumnOptions {
    /// Sets the unique flag.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets the multi-entry flag.
    #[must_use]
    pub const fn multi_entry(mut self, multi_entry: bool) -> Self {
        self.multi_entry = multi_entry;
        self
    }

    /// Sets the collation locale.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

impl From<&ColumnOptions> for IndexOptions {
    fn from(options: &ColumnOptions) -> Self {
        Self {
            unique: options.unique,
            multi_entry: options.multi_entry,
            locale: options.locale.clone(),
        }
    }
}

/// A queryable field of a table, backed by a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    options: ColumnOptions,
}

impl Column {
    /// Creates a column with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, ColumnOptions::default())
    }

    /// Creates a column with the given options.
    pub fn with_options(name: impl Into<String>, options: ColumnOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the index options.
    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }
}
