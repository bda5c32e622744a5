//! Row writes and deletes.
//!
//! Each write or delete runs in its own read-write transaction. Multi-row
//! operations run every item concurrently, wait for all of them, and report
//! each failure; items that succeeded stay applied.

use crate::connection::Connection;
use crate::error::{CoreError, CoreResult, ItemFailure};
use crate::query::Query;
use futures::future::join_all;
use indexq_codec::{Row, Value};
use indexq_storage::{StorageEngine, Transaction, TransactionMode, WriteMode};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Options for [`Connection::add`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Overwrite a row with the same key instead of failing.
    pub upsert: bool,
}

impl AddOptions {
    /// Options for an insert-or-overwrite.
    #[must_use]
    pub const fn upsert() -> Self {
        Self { upsert: true }
    }

    fn write_mode(self) -> WriteMode {
        if self.upsert {
            WriteMode::Put
        } else {
            WriteMode::Insert
        }
    }
}

impl<E: StorageEngine> Connection<E> {
    /// Writes one row and returns its primary key.
    ///
    /// Without `upsert`, a row whose key already exists is rejected by the
    /// engine and reported as [`CoreError::Write`].
    ///
    /// # Errors
    ///
    /// Fails with `NotInitialized`, `MissingTable` or `InvalidRow` before
    /// any engine call, or with `Transaction`/`Write` if the engine fails.
    pub async fn add(&self, table: &str, row: Row, options: AddOptions) -> CoreResult<Value> {
        let engine = self.engine()?;
        let table = self.table(table)?;

        let key = row.get(table.key_column()).cloned();
        if key.is_none() && !table.auto_increment() {
            return Err(CoreError::invalid_row(
                table.name(),
                format!("row has no {} field", table.key_column()),
            ));
        }

        let write_error = |source| CoreError::Write {
            table: table.name().to_string(),
            key: key.clone(),
            source,
        };
        let mut txn = engine
            .begin(TransactionMode::ReadWrite)
            .await
            .map_err(|source| CoreError::Transaction {
                table: table.name().to_string(),
                source,
            })?;
        let assigned = txn
            .write_row(table.name(), row, options.write_mode())
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(write_error)?;

        debug!(table = table.name(), key = ?assigned, upsert = options.upsert, "row written");
        Ok(assigned)
    }

    /// Writes every row concurrently and returns their keys in input order.
    ///
    /// # Errors
    ///
    /// Fails with `NotInitialized` or `MissingTable` before any write.
    /// Otherwise every row is attempted; if any fails the result is
    /// [`CoreError::Batch`] listing each failure by input position.
    pub async fn multi_add(
        &self,
        table: &str,
        rows: Vec<Row>,
        options: AddOptions,
    ) -> CoreResult<Vec<Value>> {
        self.engine()?;
        self.table(table)?;

        let total = rows.len();
        let outcomes = join_all(rows.into_iter().map(|row| self.add(table, row, options))).await;
        collect_outcomes(table, total, outcomes)
    }

    /// Deletes the rows of `table` matching `query` and returns how many
    /// were deleted.
    ///
    /// # Errors
    ///
    /// Fails like [`Connection::select`] while finding the rows. Every key is
    /// then deleted in its own transaction; if any fails the result is
    /// [`CoreError::Batch`].
    pub async fn delete(&self, table: &str, query: &Query) -> CoreResult<usize> {
        let engine = self.engine()?;
        let table = self.table(table)?;

        let victims = self.find(engine.as_ref(), table, query).await?;
        let mut keys = BTreeSet::new();
        for row in victims {
            match row.get(table.key_column()) {
                Some(key) => {
                    keys.insert(key.clone());
                }
                None => warn!(table = table.name(), "matched row has no key, skipping"),
            }
        }

        let total = keys.len();
        let deletes = keys.into_iter().map(|key| {
            let engine = engine.as_ref();
            async move {
                let mut txn = engine
                    .begin(TransactionMode::ReadWrite)
                    .await
                    .map_err(|source| CoreError::Transaction {
                        table: table.name().to_string(),
                        source,
                    })?;
                let deleted = match txn.delete_row(table.name(), &key).await {
                    Ok(()) => txn.commit().await,
                    Err(err) => Err(err),
                };
                deleted.map_err(|source| CoreError::Delete {
                    table: table.name().to_string(),
                    key,
                    source,
                })
            }
        });
        let outcomes = join_all(deletes).await;
        let deleted = collect_outcomes(table.name(), total, outcomes)?.len();

        debug!(table = table.name(), deleted, "rows deleted");
        Ok(deleted)
    }
}

/// Returns every success, or every failure with its input position.
fn collect_outcomes<T>(
    table: &str,
    total: usize,
    outcomes: Vec<CoreResult<T>>,
) -> CoreResult<Vec<T>> {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => values.push(value),
            Err(error) => failures.push(ItemFailure { index, error }),
        }
    }
    if failures.is_empty() {
        Ok(values)
    } else {
        Err(CoreError::Batch {
            table: table.to_string(),
            total,
            failures,
        })
    }
}
