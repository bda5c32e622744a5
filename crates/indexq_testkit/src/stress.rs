//! Stress helpers for IndexQ.
//!
//! Each run issues many operations concurrently on one connection and waits
//! for all of them, so writers queue on the engine's writer lock while
//! selects and deletes interleave with them.

use crate::fixtures::{person, PEOPLE};
use futures::future::join_all;
use indexq_core::{AddOptions, MemoryConnection, Query};
use std::time::{Duration, Instant};

/// Outcome of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Operations issued.
    pub total_ops: usize,
    /// Operations that returned an error.
    pub failed_ops: usize,
    /// Wall-clock time until the last operation finished.
    pub duration: Duration,
}

impl StressTestResult {
    /// Operations that succeeded.
    pub fn successful_ops(&self) -> usize {
        self.total_ops - self.failed_ops
    }

    /// Completed operations per second, zero for an instant run.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of distinct keys written.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            key_count: 100,
        }
    }
}

fn tally<T, E>(outcomes: Vec<Result<T, E>>, start: Instant) -> StressTestResult {
    StressTestResult {
        total_ops: outcomes.len(),
        failed_ops: outcomes.iter().filter(|o| o.is_err()).count(),
        duration: start.elapsed(),
    }
}

/// Upserts `operations` rows concurrently over `key_count` keys.
pub async fn stress_concurrent_writes(
    conn: &MemoryConnection,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let writes = (0..config.operations).map(|i| {
        let id = (i % config.key_count) as i64;
        conn.add(PEOPLE, person(id, "Stress", "Test", i as i64), AddOptions::upsert())
    });
    tally(join_all(writes).await, start)
}

/// Runs a concurrent mix of upserts, selects and deletes.
pub async fn stress_mixed_operations(
    conn: &MemoryConnection,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let ops = (0..config.operations).map(|i| {
        let id = (i % config.key_count) as i64;
        async move {
            match i % 3 {
                0 => conn
                    .add(PEOPLE, person(id, "Stress", "Test", id), AddOptions::upsert())
                    .await
                    .map(|_| ()),
                1 => conn
                    .select(PEOPLE, &Query::new().gte("age", id))
                    .await
                    .map(|_| ()),
                _ => conn
                    .delete(PEOPLE, &Query::new().eq("id", id))
                    .await
                    .map(|_| ()),
            }
        }
    });
    tally(join_all(ops).await, start)
}
