//! Benchmark utilities.

use indexq_codec::Row;
use indexq_core::{AddOptions, Config, Connection, Database, MemoryConnection, Table};
use indexq_storage::MemoryFactory;
use rand::Rng;

/// Name of the benchmark table.
pub const TABLE: &str = "People";

/// Builds a current-thread runtime for driving async calls.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime")
}

/// Generates `count` people with random ages and cities.
pub fn random_people(count: usize) -> Vec<Row> {
    const CITIES: [&str; 5] = ["Paris", "Lima", "Oslo", "Kyiv", "Pune"];
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|id| {
            Row::new()
                .with("id", id as i64)
                .with("age", rng.gen_range(0..100i64))
                .with("city", CITIES[rng.gen_range(0..CITIES.len())])
                .with("score", rng.gen::<f64>())
        })
        .collect()
}

/// Opens an in-memory store holding `count` random people.
pub async fn populated(count: usize) -> MemoryConnection {
    let table = Table::builder(TABLE)
        .key("id")
        .column("age")
        .column("city")
        .build()
        .expect("valid table");
    let db = Database::new("bench", vec![table]).expect("valid database");
    let conn = Connection::open(&MemoryFactory::new(), db, Config::default())
        .await
        .expect("failed to open store");
    conn.multi_add(TABLE, random_people(count), AddOptions::default())
        .await
        .expect("failed to add people");
    conn
}
