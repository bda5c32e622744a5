//! Transactions and upgrades of the in-memory engine.

use super::table::StoreData;
use super::StoreShared;
use crate::engine::{IndexOptions, SchemaUpgrade, Transaction, TransactionMode, WriteMode};
use crate::error::{StorageError, StorageResult};
use crate::range::KeyRange;
use indexq_codec::{Row, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// A transaction over a [`super::MemoryEngine`].
///
/// Reads see the snapshot taken when the transaction began. A read-write
/// transaction holds the store's writer lock, works on its own copy of the
/// data, and publishes that copy on commit.
pub struct MemoryTransaction {
    mode: TransactionMode,
    shared: Arc<StoreShared>,
    closed: Arc<AtomicBool>,
    data: Arc<StoreData>,
    dirty: bool,
    _writer: Option<OwnedMutexGuard<()>>,
}

impl MemoryTransaction {
    pub(super) fn new(
        mode: TransactionMode,
        shared: Arc<StoreShared>,
        closed: Arc<AtomicBool>,
        writer: Option<OwnedMutexGuard<()>>,
    ) -> Self {
        let data = Arc::clone(&shared.data.read());
        Self {
            mode,
            shared,
            closed,
            data,
            dirty: false,
            _writer: writer,
        }
    }

    fn writable(&mut self) -> StorageResult<&mut StoreData> {
        if self.mode == TransactionMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        self.dirty = true;
        Ok(Arc::make_mut(&mut self.data))
    }
}

impl Transaction for MemoryTransaction {
    async fn scan_index(
        &self,
        table: &str,
        field: &str,
        range: &KeyRange,
    ) -> StorageResult<Vec<Row>> {
        self.data.table(table)?.scan_index(field, range)
    }

    async fn scan_primary(
        &self,
        table: &str,
        range: Option<&KeyRange>,
    ) -> StorageResult<Vec<Row>> {
        self.data.table(table)?.scan_primary(range)
    }

    async fn write_row(
        &mut self,
        table: &str,
        row: Row,
        mode: WriteMode,
    ) -> StorageResult<Value> {
        self.writable()?.table_mut(table)?.put(row, mode)
    }

    async fn delete_row(&mut self, table: &str, key: &Value) -> StorageResult<()> {
        self.writable()?.table_mut(table)?.delete(key)
    }

    async fn commit(self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        if self.dirty {
            *self.shared.data.write() = self.data;
        }
        Ok(())
    }
}

/// Schema changes applied to a working copy during an upgrade.
pub(super) struct UpgradeContext<'a> {
    pub(super) old_version: u32,
    pub(super) new_version: u32,
    pub(super) data: &'a mut StoreData,
}

impl SchemaUpgrade for UpgradeContext<'_> {
    fn old_version(&self) -> u32 {
        self.old_version
    }

    fn new_version(&self) -> u32 {
        self.new_version
    }

    fn has_table(&self, table: &str) -> bool {
        self.data.has_table(table)
    }

    fn index_options(&self, table: &str, field: &str) -> Option<IndexOptions> {
        self.data.table(table).ok()?.index_options(field).cloned()
    }

    fn create_table(
        &mut self,
        table: &str,
        key_field: &str,
        auto_increment: bool,
    ) -> StorageResult<()> {
        self.data.create_table(table, key_field, auto_increment)
    }

    fn create_index(
        &mut self,
        table: &str,
        field: &str,
        options: &IndexOptions,
    ) -> StorageResult<()> {
        self.data.table_mut(table)?.create_index(field, options)
    }
}
