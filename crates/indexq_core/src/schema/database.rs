//! Database descriptors.

use super::table::Table;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;

/// The schema of one store: its name and its tables.
///
/// Table lookups by name are O(1). The lookup map and the name list are
/// derived from the table list and rebuilt whenever it changes.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    tables: Vec<Table>,
    table_map: HashMap<String, usize>,
    table_names: Vec<String>,
}

impl Database {
    /// Creates a database descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the name is empty or two
    /// tables share a name.
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> CoreResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::configuration("database has no name"));
        }
        let mut db = Self {
            name,
            tables,
            table_map: HashMap::new(),
            table_names: Vec::new(),
        };
        db.reindex()?;
        Ok(db)
    }

    fn reindex(&mut self) -> CoreResult<()> {
        let mut table_map = HashMap::with_capacity(self.tables.len());
        for (pos, table) in self.tables.iter().enumerate() {
            if table_map.insert(table.name().to_string(), pos).is_some() {
                return Err(CoreError::configuration(format!(
                    "database {} declares table {} more than once",
                    self.name,
                    table.name()
                )));
            }
        }
        self.table_names = self.tables.iter().map(|t| t.name().to_string()).collect();
        self.table_map = table_map;
        Ok(())
    }

    /// Returns the store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns the table names in declaration order.
    pub fn table_names(&self) -> &[String] {
        &self.table_names
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.table_map.get(name).map(|&pos| &self.tables[pos])
    }

    /// Returns a copy of this database with `table` added.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a table with the same name exists.
    pub fn with_table(mut self, table: Table) -> CoreResult<Self> {
        self.tables.push(table);
        self.reindex()?;
        Ok(self)
    }

    /// Returns a copy of this database without the named table.
    #[must_use]
    pub fn without_table(mut self, name: &str) -> Self {
        self.tables.retain(|t| t.name() != name);
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(pos, t)| (t.name().to_string(), pos))
            .collect();
        self.table_names = self.tables.iter().map(|t| t.name().to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Table {
        Table::builder(name).key("id").column("age").build().unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let db = Database::new("app", vec![table("People"), table("Pets")]).unwrap();
        assert_eq!(db.name(), "app");
        assert_eq!(db.table_names(), ["People", "Pets"]);
        assert_eq!(db.table("Pets").unwrap().name(), "Pets");
        assert!(db.table("NoSuchTable").is_none());
    }

    #[test]
    fn duplicate_tables_are_rejected() {
        let err = Database::new("app", vec![table("People"), table("People")]).unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));

        let db = Database::new("app", vec![table("People")]).unwrap();
        assert!(db.with_table(table("People")).is_err());
    }

    #[test]
    fn derived_indexes_follow_changes() {
        let db = Database::new("app", vec![table("People"), table("Pets")])
            .unwrap()
            .with_table(table("Cars"))
            .unwrap()
            .without_table("People");

        assert_eq!(db.table_names(), ["Pets", "Cars"]);
        assert_eq!(db.table("Cars").unwrap().name(), "Cars");
        assert!(db.table("People").is_none());
        assert_eq!(db.tables().len(), 2);
    }
}
