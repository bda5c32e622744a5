//! Table descriptors.

use super::column::{Column, ColumnOptions};
use crate::error::{CoreError, CoreResult};
use std::collections::HashSet;
use tracing::warn;

/// Where the rows for a field are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget<'a> {
    /// The field is the primary key; scan the table itself.
    Primary,
    /// The field has a secondary index.
    Column(&'a Column),
}

/// A table of a database.
///
/// Every declared column becomes a secondary index. Rows may carry other
/// fields as well; those are stored but cannot be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    key_column: String,
    columns: Vec<Column>,
    auto_increment: bool,
}

impl Table {
    /// Starts building a table.
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            key_column: None,
            columns: Vec::new(),
            auto_increment: false,
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary key field.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Returns the indexed columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns true if the engine assigns keys.
    pub fn auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Returns true if `field` is the primary key.
    pub fn is_key(&self, field: &str) -> bool {
        self.key_column == field
    }

    /// Returns the column declared for `field`.
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == field)
    }

    /// Resolves how rows are looked up by `field`.
    ///
    /// The key column always resolves to the primary store, even when it is
    /// also listed as a column.
    pub fn index_for(&self, field: &str) -> Option<IndexTarget<'_>> {
        if self.is_key(field) {
            Some(IndexTarget::Primary)
        } else {
            self.column(field).map(IndexTarget::Column)
        }
    }

    /// Returns true if `field` can be queried.
    pub fn has_index(&self, field: &str) -> bool {
        self.index_for(field).is_some()
    }
}

/// Builder for [`Table`].
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    key_column: Option<String>,
    columns: Vec<Column>,
    auto_increment: bool,
}

impl TableBuilder {
    /// Sets the primary key field.
    #[must_use]
    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.key_column = Some(field.into());
        self
    }

    /// Adds an indexed column with default options.
    #[must_use]
    pub fn column(self, name: impl Into<String>) -> Self {
        self.column_with(name, ColumnOptions::default())
    }

    /// Adds an indexed column.
    #[must_use]
    pub fn column_with(mut self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.columns.push(Column::with_options(name, options));
        self
    }

    /// Lets the engine assign keys.
    #[must_use]
    pub const fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the name or the key column is
    /// missing or empty.
    pub fn build(self) -> CoreResult<Table> {
        if self.name.is_empty() {
            return Err(CoreError::configuration("table has no name"));
        }
        let key_column = match self.key_column {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(CoreError::configuration(format!(
                    "table {} has no key column",
                    self.name
                )))
            }
        };

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name() == key_column {
                warn!(
                    table = %self.name,
                    column = column.name(),
                    "key column is also listed as a column"
                );
            }
            if !seen.insert(column.name()) {
                warn!(
                    table = %self.name,
                    column = column.name(),
                    "column is listed more than once"
                );
            }
        }

        Ok(Table {
            name: self.name,
            key_column,
            columns: self.columns,
            auto_increment: self.auto_increment,
        })
    }
}
