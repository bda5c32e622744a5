//! Table and index state of the in-memory engine.

use crate::engine::{IndexOptions, WriteMode};
use crate::error::{StorageError, StorageResult};
use crate::range::KeyRange;
use indexq_codec::{decode_row, encode_row, Row, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Every table of one store. Cloned wholesale by write transactions.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreData {
    tables: BTreeMap<String, TableState>,
}

impl StoreData {
    pub(crate) fn table(&self, name: &str) -> StorageResult<&TableState> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::table_not_found(name))
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> StorageResult<&mut TableState> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StorageError::table_not_found(name))
    }

    pub(crate) fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub(crate) fn create_table(
        &mut self,
        name: &str,
        key_field: &str,
        auto_increment: bool,
    ) -> StorageResult<()> {
        if self.has_table(name) {
            return Err(StorageError::AlreadyExists(format!("table {name}")));
        }
        self.tables.insert(
            name.to_string(),
            TableState::new(name, key_field, auto_increment),
        );
        Ok(())
    }
}

/// Rows of one table, stored in canonical form, plus its indexes.
#[derive(Debug, Clone)]
pub(crate) struct TableState {
    name: String,
    key_field: String,
    auto_increment: bool,
    /// Next generated key for auto-increment tables, `None` once the key
    /// space is used up.
    next_key: Option<i64>,
    rows: BTreeMap<Value, Vec<u8>>,
    indexes: BTreeMap<String, IndexState>,
}

impl TableState {
    fn new(name: &str, key_field: &str, auto_increment: bool) -> Self {
        Self {
            name: name.to_string(),
            key_field: key_field.to_string(),
            auto_increment,
            next_key: Some(1),
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
        }
    }

    pub(crate) fn has_index(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }

    pub(crate) fn index_options(&self, field: &str) -> Option<&IndexOptions> {
        self.indexes.get(field).map(|index| &index.options)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn create_index(
        &mut self,
        field: &str,
        options: &IndexOptions,
    ) -> StorageResult<()> {
        if self.has_index(field) {
            return Err(StorageError::AlreadyExists(format!(
                "index {field} on table {}",
                self.name
            )));
        }

        let mut index = IndexState::new(field, options.clone());
        for (key, bytes) in &self.rows {
            let keys = index.keys_for(&decode_row(bytes)?);
            if let Some(taken) = index.unique_conflict(&keys, key) {
                return Err(StorageError::constraint(
                    &self.name,
                    format!("unique index {field} has duplicate key {taken:?}"),
                ));
            }
            index.insert(keys, key);
        }
        self.indexes.insert(field.to_string(), index);
        Ok(())
    }

    /// Writes a row, keeping every index in step. Nothing changes on error.
    pub(crate) fn put(&mut self, mut row: Row, mode: WriteMode) -> StorageResult<Value> {
        let key = match row.get(&self.key_field) {
            Some(key) if key.is_indexable() => key.clone(),
            Some(key) => {
                return Err(StorageError::invalid_key(
                    &self.name,
                    format!("{} value cannot be a key", key.type_name()),
                ))
            }
            None if self.auto_increment => {
                let Some(next) = self.next_key else {
                    return Err(StorageError::constraint(
                        &self.name,
                        "auto-increment key space exhausted",
                    ));
                };
                let key = Value::Integer(next);
                row.set(self.key_field.clone(), key.clone());
                key
            }
            None => {
                return Err(StorageError::invalid_key(
                    &self.name,
                    format!("row has no {} field", self.key_field),
                ))
            }
        };

        let previous = match self.rows.get(&key) {
            Some(_) if mode == WriteMode::Insert => {
                return Err(StorageError::constraint(
                    &self.name,
                    format!("key {key:?} already exists"),
                ))
            }
            Some(bytes) => Some(decode_row(bytes)?),
            None => None,
        };
        let bytes = encode_row(&row)?;

        for index in self.indexes.values() {
            if let Some(taken) = index.unique_conflict(&index.keys_for(&row), &key) {
                return Err(StorageError::constraint(
                    &self.name,
                    format!("unique index {} already has key {taken:?}", index.field),
                ));
            }
        }

        for index in self.indexes.values_mut() {
            if let Some(previous) = &previous {
                let old_keys = index.keys_for(previous);
                index.remove(&old_keys, &key);
            }
            let new_keys = index.keys_for(&row);
            index.insert(new_keys, &key);
        }

        if self.auto_increment {
            if let Value::Integer(n) = key {
                if self.next_key.is_some_and(|next| n >= next) {
                    self.next_key = n.checked_add(1);
                }
            }
        }
        self.rows.insert(key.clone(), bytes);
        Ok(key)
    }

    pub(crate) fn delete(&mut self, key: &Value) -> StorageResult<()> {
        let Some(bytes) = self.rows.remove(key) else {
            return Ok(());
        };
        let row = decode_row(&bytes)?;
        for index in self.indexes.values_mut() {
            let keys = index.keys_for(&row);
            index.remove(&keys, key);
        }
        Ok(())
    }

    pub(crate) fn scan_primary(&self, range: Option<&KeyRange>) -> StorageResult<Vec<Row>> {
        let bytes: Vec<&Vec<u8>> = match range {
            None => self.rows.values().collect(),
            Some(range) => match range.bounds() {
                Some(bounds) => self.rows.range::<Value, _>(bounds).map(|(_, b)| b).collect(),
                None => Vec::new(),
            },
        };
        bytes
            .into_iter()
            .map(|b| decode_row(b).map_err(StorageError::from))
            .collect()
    }

    pub(crate) fn scan_index(&self, field: &str, range: &KeyRange) -> StorageResult<Vec<Row>> {
        let index = self
            .indexes
            .get(field)
            .ok_or_else(|| StorageError::IndexNotFound {
                table: self.name.clone(),
                index: field.to_string(),
            })?;
        let Some(bounds) = range.bounds() else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for keys in index.entries.range::<Value, _>(bounds).map(|(_, keys)| keys) {
            for key in keys {
                if let Some(bytes) = self.rows.get(key) {
                    rows.push(decode_row(bytes)?);
                }
            }
        }
        Ok(rows)
    }
}

/// Index key to primary keys, ordered by index key.
#[derive(Debug, Clone)]
pub(crate) struct IndexState {
    field: String,
    options: IndexOptions,
    entries: BTreeMap<Value, BTreeSet<Value>>,
}

impl IndexState {
    fn new(field: &str, options: IndexOptions) -> Self {
        Self {
            field: field.to_string(),
            options,
            entries: BTreeMap::new(),
        }
    }

    /// Index keys a row contributes. Missing or non-indexable values
    /// contribute none.
    fn keys_for(&self, row: &Row) -> Vec<Value> {
        match row.get(&self.field) {
            Some(Value::Array(items)) if self.options.multi_entry => {
                let set: BTreeSet<&Value> = items.iter().filter(|v| v.is_indexable()).collect();
                set.into_iter().cloned().collect()
            }
            Some(value) if value.is_indexable() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    fn unique_conflict<'a>(&self, keys: &'a [Value], owner: &Value) -> Option<&'a Value> {
        if !self.options.unique {
            return None;
        }
        keys.iter().find(|key| {
            self.entries
                .get(*key)
                .is_some_and(|owners| owners.iter().any(|o| o != owner))
        })
    }

    fn insert(&mut self, keys: Vec<Value>, owner: &Value) {
        for key in keys {
            self.entries.entry(key).or_default().insert(owner.clone());
        }
    }

    fn remove(&mut self, keys: &[Value], owner: &Value) {
        for key in keys {
            if let Some(owners) = self.entries.get_mut(key) {
                owners.remove(owner);
                if owners.is_empty() {
                    self.entries.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TableState {
        let mut table = TableState::new("people", "id", false);
        table.create_index("age", &IndexOptions::default()).unwrap();
        table
    }

    fn person(id: i64, age: i64) -> Row {
        Row::new().with("id", id).with("age", age)
    }

    #[test]
    fn put_and_scan_by_index() {
        let mut table = people();
        for (id, age) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
            table.put(person(id, age), WriteMode::Put).unwrap();
        }

        let rows = table
            .scan_index("age", &KeyRange::bound(20, 40, false, true))
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(ids, [Some(Value::Integer(2)), Some(Value::Integer(3))]);
    }

    #[test]
    fn overwrite_moves_index_entry() {
        let mut table = people();
        table.put(person(1, 10), WriteMode::Put).unwrap();
        table.put(person(1, 99), WriteMode::Put).unwrap();

        assert!(table.scan_index("age", &KeyRange::only(10)).unwrap().is_empty());
        assert_eq!(table.scan_index("age", &KeyRange::only(99)).unwrap().len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insert_rejects_existing_key() {
        let mut table = people();
        table.put(person(1, 10), WriteMode::Insert).unwrap();
        let err = table.put(person(1, 11), WriteMode::Insert).unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
        assert_eq!(table.scan_index("age", &KeyRange::only(10)).unwrap().len(), 1);
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut table = people();
        let err = table.put(Row::new().with("age", 3), WriteMode::Put).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[test]
    fn auto_increment_assigns_and_skips_explicit_keys() {
        let mut table = TableState::new("notes", "id", true);
        let first = table.put(Row::new().with("text", "a"), WriteMode::Put).unwrap();
        assert_eq!(first, Value::Integer(1));

        table.put(Row::new().with("id", 10).with("text", "b"), WriteMode::Put).unwrap();
        let next = table.put(Row::new().with("text", "c"), WriteMode::Put).unwrap();
        assert_eq!(next, Value::Integer(11));
    }

    #[test]
    fn auto_increment_stops_at_largest_key() {
        let mut table = TableState::new("notes", "id", true);
        table
            .put(Row::new().with("id", i64::MAX).with("text", "last"), WriteMode::Put)
            .unwrap();

        let err = table.put(Row::new().with("text", "next"), WriteMode::Put).unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn multi_entry_indexes_each_element_once() {
        let mut table = TableState::new("posts", "id", false);
        let options = IndexOptions {
            multi_entry: true,
            ..IndexOptions::default()
        };
        table.create_index("tags", &options).unwrap();

        let tags = Value::Array(vec![Value::from("rust"), Value::from("db"), Value::from("rust")]);
        table.put(Row::new().with("id", 1).with("tags", tags), WriteMode::Put).unwrap();

        assert_eq!(table.scan_index("tags", &KeyRange::only("rust")).unwrap().len(), 1);
        assert_eq!(table.scan_index("tags", &KeyRange::only("db")).unwrap().len(), 1);
    }

    #[test]
    fn unique_index_rejects_second_owner() {
        let mut table = TableState::new("users", "id", false);
        let options = IndexOptions {
            unique: true,
            ..IndexOptions::default()
        };
        table.create_index("email", &options).unwrap();

        table.put(Row::new().with("id", 1).with("email", "a@x"), WriteMode::Put).unwrap();
        // Rewriting the same row keeps its own key
        table.put(Row::new().with("id", 1).with("email", "a@x"), WriteMode::Put).unwrap();

        let err = table
            .put(Row::new().with("id", 2).with("email", "a@x"), WriteMode::Put)
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint { .. }));
    }

    #[test]
    fn delete_removes_index_entries() {
        let mut table = people();
        table.put(person(1, 10), WriteMode::Put).unwrap();
        table.delete(&Value::Integer(1)).unwrap();
        table.delete(&Value::Integer(1)).unwrap();

        assert!(table.scan_index("age", &KeyRange::only(10)).unwrap().is_empty());
        assert!(table.scan_primary(None).unwrap().is_empty());
    }

    #[test]
    fn rows_without_indexed_field_are_not_indexed() {
        let mut table = people();
        table.put(Row::new().with("id", 1), WriteMode::Put).unwrap();
        assert!(table
            .scan_index("age", &KeyRange::lower_bound(Value::Null, false))
            .unwrap()
            .is_empty());
        assert_eq!(table.scan_primary(None).unwrap().len(), 1);
    }

    #[test]
    fn unknown_index_fails() {
        let table = people();
        let err = table.scan_index("name", &KeyRange::only("x")).unwrap_err();
        assert!(matches!(err, StorageError::IndexNotFound { .. }));
    }
}
