//! Range scan execution.

use super::parser::{Clause, ParsedQuery};
use crate::error::{CoreError, CoreResult};
use crate::schema::{IndexTarget, Table};
use futures::future::{try_join, try_join_all};
use indexq_codec::Row;
use indexq_storage::Transaction;
use tracing::debug;

/// Raw row batches, one per clause.
#[derive(Debug, Default)]
pub(crate) struct ScanResults {
    pub(crate) inclusions: Vec<Vec<Row>>,
    pub(crate) exclusions: Vec<Vec<Row>>,
}

/// Fails with [`CoreError::UnknownColumn`] if any clause names a field the
/// table cannot be queried by.
pub(crate) fn check_columns(table: &Table, parsed: &ParsedQuery) -> CoreResult<()> {
    match parsed.clauses().find(|c| !table.has_index(&c.field)) {
        Some(clause) => Err(CoreError::unknown_column(table.name(), &clause.field)),
        None => Ok(()),
    }
}

/// Runs every clause of `parsed` against `txn`, concurrently.
///
/// A query without inclusion clauses gets the whole table as its single
/// inclusion batch.
pub(crate) async fn execute<T: Transaction>(
    txn: &T,
    table: &Table,
    parsed: &ParsedQuery,
) -> CoreResult<ScanResults> {
    let inclusions = async {
        if parsed.inclusions.is_empty() {
            txn.scan_primary(table.name(), None)
                .await
                .map(|rows| vec![rows])
                .map_err(|source| CoreError::Scan {
                    table: table.name().to_string(),
                    clause: "*".to_string(),
                    source,
                })
        } else {
            try_join_all(parsed.inclusions.iter().map(|c| scan_clause(txn, table, c))).await
        }
    };
    let exclusions = try_join_all(parsed.exclusions.iter().map(|c| scan_clause(txn, table, c)));

    let (inclusions, exclusions) = try_join(inclusions, exclusions).await?;
    debug!(
        table = table.name(),
        inclusion_batches = inclusions.len(),
        exclusion_batches = exclusions.len(),
        "scans complete"
    );
    Ok(ScanResults {
        inclusions,
        exclusions,
    })
}

async fn scan_clause<T: Transaction>(
    txn: &T,
    table: &Table,
    clause: &Clause,
) -> CoreResult<Vec<Row>> {
    let result = match table.index_for(&clause.field) {
        Some(IndexTarget::Primary) => txn.scan_primary(table.name(), Some(&clause.range)).await,
        Some(IndexTarget::Column(column)) => {
            txn.scan_index(table.name(), column.name(), &clause.range).await
        }
        None => return Err(CoreError::unknown_column(table.name(), &clause.field)),
    };
    result.map_err(|source| CoreError::Scan {
        table: table.name().to_string(),
        clause: clause.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{parse, Query};
    use indexq_storage::{
        IndexOptions, MemoryEngine, MemoryFactory, StorageEngine, StorageError, StoreFactory,
        TransactionMode, WriteMode,
    };

    fn people() -> Table {
        Table::builder("People")
            .key("id")
            .column("age")
            .column("name")
            .build()
            .unwrap()
    }

    async fn store(factory: &MemoryFactory) -> MemoryEngine {
        let engine = factory
            .open_store("scan", 1, |upgrade| {
                upgrade.create_table("People", "id", false)?;
                upgrade.create_index("People", "age", &IndexOptions::default())?;
                upgrade.create_index("People", "name", &IndexOptions::default())
            })
            .await
            .unwrap();
        let mut txn = engine.begin(TransactionMode::ReadWrite).await.unwrap();
        for (id, age, name) in [(1, 42, "A"), (2, 42, "B"), (3, 17, "C")] {
            let row = Row::new().with("id", id).with("age", age).with("name", name);
            txn.write_row("People", row, WriteMode::Put).await.unwrap();
        }
        txn.commit().await.unwrap();
        engine
    }

    #[test]
    fn unknown_columns_are_reported() {
        let table = people();
        let parsed = parse(&Query::new().eq("age", 1).ne("nickname", "x"));
        let err = check_columns(&table, &parsed).unwrap_err();
        assert!(matches!(err, CoreError::UnknownColumn { field, .. } if field == "nickname"));

        assert!(check_columns(&table, &parse(&Query::new().eq("id", 1))).is_ok());
    }

    #[tokio::test]
    async fn one_batch_per_clause() {
        let factory = MemoryFactory::new();
        let engine = store(&factory).await;
        let txn = engine.begin(TransactionMode::ReadOnly).await.unwrap();

        let parsed = parse(&Query::new().eq("age", 42).eq("name", "B").ne("id", 1));
        let results = execute(&txn, &people(), &parsed).await.unwrap();

        assert_eq!(results.inclusions.len(), 2);
        assert_eq!(results.inclusions[0].len(), 2);
        assert_eq!(results.inclusions[1].len(), 1);
        assert_eq!(results.exclusions.len(), 1);
        assert_eq!(results.exclusions[0].len(), 1);
    }

    #[tokio::test]
    async fn exclusion_only_scans_whole_table() {
        let factory = MemoryFactory::new();
        let engine = store(&factory).await;
        let txn = engine.begin(TransactionMode::ReadOnly).await.unwrap();

        let parsed = parse(&Query::new().ne("name", "A"));
        let results = execute(&txn, &people(), &parsed).await.unwrap();
        assert_eq!(results.inclusions.len(), 1);
        assert_eq!(results.inclusions[0].len(), 3);
    }

    #[tokio::test]
    async fn engine_failures_name_the_clause() {
        let factory = MemoryFactory::new();
        let engine = store(&factory).await;
        let txn = engine.begin(TransactionMode::ReadOnly).await.unwrap();

        let table = Table::builder("People")
            .key("id")
            .column("email")
            .build()
            .unwrap();
        let parsed = parse(&Query::new().eq("email", "a@b"));
        let err = execute(&txn, &table, &parsed).await.unwrap_err();
        match err {
            CoreError::Scan { table, clause, source } => {
                assert_eq!(table, "People");
                assert!(clause.starts_with("email"));
                assert!(matches!(source, StorageError::IndexNotFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
