//! In-memory storage engine.
//!
//! [`MemoryFactory`] keeps every store it opens in memory and is suitable for:
//! - Unit and integration tests
//! - Ephemeral stores that don't need persistence
//! - A reference for the semantics the query layer expects from a host engine
//!
//! # Thread Safety
//!
//! Handles are `Send + Sync`. Any number of read transactions may run at
//! once, each on its own snapshot. Read-write transactions are serialised by
//! an async writer lock.

mod table;
mod transaction;

pub use transaction::MemoryTransaction;

use crate::engine::{SchemaUpgrade, StorageEngine, StoreFactory, TransactionMode};
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use table::StoreData;
use tracing::{debug, info};
use transaction::UpgradeContext;

/// State of one named store, shared by every handle to it.
pub(crate) struct StoreShared {
    name: String,
    version: RwLock<u32>,
    data: RwLock<Arc<StoreData>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    handles: AtomicUsize,
}

impl StoreShared {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: RwLock::new(0),
            data: RwLock::new(Arc::new(StoreData::default())),
            writer: Arc::new(tokio::sync::Mutex::new(())),
            handles: AtomicUsize::new(0),
        }
    }
}

/// Opens in-memory stores by name.
///
/// # Example
///
/// ```rust
/// use indexq_storage::{MemoryFactory, StoreFactory, StorageEngine};
///
/// # tokio_test_block_on(async {
/// let factory = MemoryFactory::new();
/// let engine = factory
///     .open_store("app", 1, |upgrade| upgrade.create_table("people", "id", false))
///     .await
///     .unwrap();
/// assert_eq!(engine.version(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct MemoryFactory {
    stores: Mutex<HashMap<String, Arc<StoreShared>>>,
}

impl MemoryFactory {
    /// Creates a factory with no stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the version on record for `name`, if the store exists.
    pub fn version_of(&self, name: &str) -> Option<u32> {
        self.stores.lock().get(name).map(|s| *s.version.read())
    }

    /// Returns the names of all stores, sorted.
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.stores.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Deletes a store and all its data.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Blocked`] while handles to the store are open.
    pub fn delete_store(&self, name: &str) -> StorageResult<()> {
        let mut stores = self.stores.lock();
        if let Some(shared) = stores.get(name) {
            if shared.handles.load(Ordering::SeqCst) > 0 {
                return Err(StorageError::Blocked {
                    name: name.to_string(),
                });
            }
        }
        stores.remove(name);
        Ok(())
    }

    fn shared(&self, name: &str) -> Arc<StoreShared> {
        let mut stores = self.stores.lock();
        Arc::clone(
            stores
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(StoreShared::new(name))),
        )
    }
}

impl StoreFactory for MemoryFactory {
    type Engine = MemoryEngine;

    async fn open_store<F>(
        &self,
        name: &str,
        version: u32,
        upgrade: F,
    ) -> StorageResult<MemoryEngine>
    where
        F: FnOnce(&mut dyn SchemaUpgrade) -> StorageResult<()> + Send,
    {
        if version == 0 {
            return Err(StorageError::InvalidVersion(version));
        }

        let shared = self.shared(name);
        let current = *shared.version.read();
        if version < current {
            return Err(StorageError::VersionMismatch {
                name: name.to_string(),
                requested: version,
                current,
            });
        }

        if version > current {
            if shared.handles.load(Ordering::SeqCst) > 0 {
                return Err(StorageError::Blocked {
                    name: name.to_string(),
                });
            }

            let _writer = shared.writer.lock().await;
            let mut working = StoreData::clone(&shared.data.read());
            let mut ctx = UpgradeContext {
                old_version: current,
                new_version: version,
                data: &mut working,
            };
            upgrade(&mut ctx)?;

            *shared.data.write() = Arc::new(working);
            *shared.version.write() = version;
            info!(store = name, from = current, to = version, "store upgraded");
        }

        shared.handles.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryEngine {
            shared,
            version,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// An open handle to an in-memory store.
pub struct MemoryEngine {
    shared: Arc<StoreShared>,
    version: u32,
    closed: Arc<AtomicBool>,
}

impl StorageEngine for MemoryEngine {
    type Transaction = MemoryTransaction;

    fn name(&self) -> &str {
        &self.shared.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    async fn begin(&self, mode: TransactionMode) -> StorageResult<MemoryTransaction> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        let writer = match mode {
            TransactionMode::ReadWrite => {
                Some(Arc::clone(&self.shared.writer).lock_owned().await)
            }
            TransactionMode::ReadOnly => None,
        };
        Ok(MemoryTransaction::new(
            mode,
            Arc::clone(&self.shared),
            Arc::clone(&self.closed),
            writer,
        ))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared.handles.fetch_sub(1, Ordering::SeqCst);
            debug!(store = %self.shared.name, "store handle closed");
        }
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        self.close();
    }
}
