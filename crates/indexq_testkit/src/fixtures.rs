//! Test fixtures and connection helpers.
//!
//! The people schema is the running example of the test suite: a `People`
//! table keyed by `id` with indexes on the name fields, `age`, a unique
//! `email` and a multi-entry `tags`, plus an auto-increment `Notes` table.

use indexq_codec::{Row, Value};
use indexq_core::{
    AddOptions, ColumnOptions, Config, Connection, Database, MemoryConnection, Table,
};
use indexq_storage::MemoryFactory;
use std::ops::Deref;

/// Name of the people table.
pub const PEOPLE: &str = "People";

/// Name of the auto-increment notes table.
pub const NOTES: &str = "Notes";

/// Returns the people table descriptor.
pub fn people_table() -> Table {
    Table::builder(PEOPLE)
        .key("id")
        .column("firstName")
        .column("lastName")
        .column("age")
        .column_with("email", ColumnOptions::default().unique(true))
        .column_with("tags", ColumnOptions::default().multi_entry(true))
        .build()
        .expect("people table is valid")
}

/// Returns the notes table descriptor.
pub fn notes_table() -> Table {
    Table::builder(NOTES)
        .key("id")
        .column("topic")
        .auto_increment(true)
        .build()
        .expect("notes table is valid")
}

/// Returns a database holding the people and notes tables.
pub fn people_database(name: &str) -> Database {
    Database::new(name, vec![people_table(), notes_table()]).expect("people database is valid")
}

/// Builds one person row.
pub fn person(id: i64, first: &str, last: &str, age: i64) -> Row {
    Row::new()
        .with("id", id)
        .with("firstName", first)
        .with("lastName", last)
        .with("age", age)
}

/// Builds a tag array.
pub fn tags(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|&t| Value::from(t)).collect())
}

/// Returns the six sample people. Two are Gilmores; two are Johns aged 69.
pub fn people_rows() -> Vec<Row> {
    vec![
        person(1, "John", "Gilmore", 69).with("email", "john@gilmore.example"),
        person(2, "John", "Doe", 69).with("email", "john@doe.example"),
        person(3, "Rory", "Gilmore", 22).with("tags", tags(&["student", "writer"])),
        person(4, "Jane", "Doe", 17).with("tags", tags(&["student"])),
        person(5, "John", "Smith", 40),
        person(6, "Ann", "Lee", 12),
    ]
}

/// A connection with its factory kept alive.
pub struct TestConnection {
    /// The connection.
    pub conn: MemoryConnection,
    /// The factory the store lives in.
    pub factory: MemoryFactory,
}

impl TestConnection {
    /// Opens an empty store with the people schema.
    pub async fn empty() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Opens an empty store with the people schema and `config`.
    pub async fn with_config(config: Config) -> Self {
        let factory = MemoryFactory::new();
        let conn = Connection::open(&factory, people_database("people"), config)
            .await
            .expect("failed to open people store");
        Self { conn, factory }
    }

    /// Opens a store with the people schema and the six sample rows.
    pub async fn populated() -> Self {
        let test = Self::empty().await;
        test.conn
            .multi_add(PEOPLE, people_rows(), AddOptions::default())
            .await
            .expect("failed to add sample people");
        test
    }
}

impl Deref for TestConnection {
    type Target = MemoryConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

/// Opens a store holding the six sample people.
pub async fn people_connection() -> TestConnection {
    TestConnection::populated().await
}

/// Returns the integer ids of `rows`, sorted.
pub fn sorted_ids(rows: &[Row]) -> Vec<i64> {
    let mut ids: Vec<_> = rows
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_integer()))
        .collect();
    ids.sort_unstable();
    ids
}
