//! Connections to a store.

use crate::config::{Config, EmptyQuery};
use crate::error::{CoreError, CoreResult};
use crate::query::{merge, parse, scan, Query};
use crate::schema::{Database, Table};
use indexq_codec::Row;
use indexq_storage::{
    IndexOptions, MemoryEngine, SchemaUpgrade, StorageEngine, StorageResult, StoreFactory,
    TransactionMode,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A connection backed by the in-memory engine.
pub type MemoryConnection = Connection<MemoryEngine>;

/// An open store together with its schema.
///
/// Every operation validates its arguments against the schema before it
/// touches the engine. After [`Connection::close`] every operation fails
/// with [`CoreError::NotInitialized`].
///
/// # Example
///
/// ```rust
/// use indexq_core::{Config, Connection, Database, Query, Table};
/// use indexq_codec::Row;
/// use indexq_storage::MemoryFactory;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let people = Table::builder("People").key("id").column("age").build().unwrap();
/// let db = Database::new("app", vec![people]).unwrap();
/// let conn = Connection::open(&MemoryFactory::new(), db, Config::default()).await.unwrap();
///
/// conn.add("People", Row::new().with("id", 1).with("age", 42), Default::default())
///     .await
///     .unwrap();
/// let rows = conn.select("People", &Query::new().gte("age", 18)).await.unwrap();
/// assert_eq!(rows.len(), 1);
/// # });
/// ```
pub struct Connection<E: StorageEngine> {
    engine: RwLock<Option<Arc<E>>>,
    database: Database,
    config: Config,
}

impl<E: StorageEngine> Connection<E> {
    /// Opens the store named after `database` at `config.version`.
    ///
    /// When the store is new or older than `config.version`, every table and
    /// index the store lacks is created.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Connection`] if the engine cannot open or
    /// upgrade the store, for example while another handle blocks the upgrade.
    pub async fn open<F>(factory: &F, database: Database, config: Config) -> CoreResult<Self>
    where
        F: StoreFactory<Engine = E>,
    {
        let engine = factory
            .open_store(database.name(), config.version, |upgrade| {
                apply_schema(upgrade, &database)
            })
            .await
            .map_err(|source| CoreError::Connection {
                name: database.name().to_string(),
                source,
            })?;

        info!(
            store = database.name(),
            version = config.version,
            tables = database.tables().len(),
            "connection opened"
        );
        Ok(Self {
            engine: RwLock::new(Some(Arc::new(engine))),
            database,
            config,
        })
    }

    /// Returns the schema.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true until [`Connection::close`] is called.
    pub fn is_open(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Closes the store handle. Later calls do nothing.
    pub fn close(&self) {
        if let Some(engine) = self.engine.write().take() {
            engine.close();
            info!(store = self.database.name(), "connection closed");
        }
    }

    /// Returns the rows of `table` matching `query`.
    ///
    /// # Errors
    ///
    /// Fails with `NotInitialized`, `MissingTable`, `UnknownColumn` or
    /// `InvalidQuery` before any engine call, or with `Transaction`/`Scan`
    /// if the engine fails.
    pub async fn select(&self, table: &str, query: &Query) -> CoreResult<Vec<Row>> {
        let engine = self.engine()?;
        let table = self.table(table)?;
        self.find(engine.as_ref(), table, query).await
    }

    /// Returns the number of rows of `table` matching `query`.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::select`].
    pub async fn count(&self, table: &str, query: &Query) -> CoreResult<usize> {
        Ok(self.select(table, query).await?.len())
    }

    pub(crate) fn engine(&self) -> CoreResult<Arc<E>> {
        self.engine.read().clone().ok_or(CoreError::NotInitialized)
    }

    pub(crate) fn table(&self, name: &str) -> CoreResult<&Table> {
        self.database
            .table(name)
            .ok_or_else(|| CoreError::missing_table(name))
    }

    /// Parses, scans and merges `query`. Shared by select and delete.
    pub(crate) async fn find(
        &self,
        engine: &E,
        table: &Table,
        query: &Query,
    ) -> CoreResult<Vec<Row>> {
        let parsed = parse(query);
        if parsed.is_empty() && self.config.empty_query == EmptyQuery::Reject {
            return Err(CoreError::invalid_query(table.name(), "query has no clauses"));
        }
        scan::check_columns(table, &parsed)?;
        debug!(
            table = table.name(),
            inclusions = parsed.inclusions.len(),
            exclusions = parsed.exclusions.len(),
            "query parsed"
        );

        let txn = engine
            .begin(TransactionMode::ReadOnly)
            .await
            .map_err(|source| CoreError::Transaction {
                table: table.name().to_string(),
                source,
            })?;
        let results = scan::execute(&txn, table, &parsed).await?;
        merge(results.inclusions, results.exclusions)
    }
}

/// Creates every table and index of `database` missing from the store.
///
/// Existing indexes keep the options they were created with. A column whose
/// options changed only logs a warning.
fn apply_schema(upgrade: &mut dyn SchemaUpgrade, database: &Database) -> StorageResult<()> {
    for table in database.tables() {
        if !upgrade.has_table(table.name()) {
            upgrade.create_table(table.name(), table.key_column(), table.auto_increment())?;
        }
        for column in table.columns() {
            if table.is_key(column.name()) {
                continue;
            }
            let wanted = IndexOptions::from(column.options());
            match upgrade.index_options(table.name(), column.name()) {
                None => upgrade.create_index(table.name(), column.name(), &wanted)?,
                Some(stored) if stored != wanted => warn!(
                    table = table.name(),
                    column = column.name(),
                    ?stored,
                    ?wanted,
                    "index options changed; keeping the stored index"
                ),
                Some(_) => {}
            }
        }
    }
    debug!(
        store = database.name(),
        from = upgrade.old_version(),
        to = upgrade.new_version(),
        "schema applied"
    );
    Ok(())
}
