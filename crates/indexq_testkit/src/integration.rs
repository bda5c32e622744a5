//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] drives a connection while tracking what it expects
//! the store to hold, so tests can check the store against that model after
//! any sequence of writes and deletes.

use crate::fixtures::{TestConnection, PEOPLE};
use crate::oracle;
use indexq_codec::{Row, Value};
use indexq_core::{AddOptions, Query};
use std::collections::BTreeMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The connection under test.
    pub store: TestConnection,
    /// Rows the store is expected to hold, by key.
    rows: BTreeMap<Value, Row>,
}

impl IntegrationHarness {
    /// Creates a harness over an empty people store.
    pub async fn new() -> Self {
        Self {
            store: TestConnection::empty().await,
            rows: BTreeMap::new(),
        }
    }

    /// Upserts a person and tracks it.
    pub async fn put(&mut self, row: Row) {
        let key = self
            .store
            .add(PEOPLE, row.clone(), AddOptions::upsert())
            .await
            .expect("failed to add row");
        self.rows.insert(key, row);
    }

    /// Deletes the people matching `query` and checks the count against the
    /// model.
    pub async fn delete(&mut self, query: &Query) -> usize {
        let expected: Vec<Value> = self
            .rows
            .iter()
            .filter(|(_, row)| oracle::matches(row, query))
            .map(|(key, _)| key.clone())
            .collect();

        let deleted = self
            .store
            .delete(PEOPLE, query)
            .await
            .expect("failed to delete rows");
        assert_eq!(deleted, expected.len(), "deleted count mismatch for {query:?}");

        for key in expected {
            self.rows.remove(&key);
        }
        deleted
    }

    /// Checks that `query` returns what the model predicts.
    pub async fn select_and_verify(&self, query: &Query) -> Vec<Row> {
        let mut actual = self
            .store
            .select(PEOPLE, query)
            .await
            .expect("failed to select rows");
        let tracked: Vec<Row> = self.rows.values().cloned().collect();
        let expected = oracle::evaluate(&tracked, query);

        actual.sort_by(|a, b| a.get("id").cmp(&b.get("id")));
        assert_eq!(actual, expected, "select mismatch for {query:?}");
        actual
    }

    /// Checks that the store holds exactly the tracked rows.
    pub async fn verify_all(&self) {
        self.select_and_verify(&Query::new()).await;
    }

    /// Returns the count of tracked rows.
    pub fn tracked_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{people_connection, person, sorted_ids, NOTES};
    use indexq_core::{Config, CoreError, EmptyQuery};
    use indexq_storage::StorageError;
    use serde_json::json;

    #[tokio::test]
    async fn test_integration_harness() {
        let mut harness = IntegrationHarness::new().await;
        for (id, age) in [(1, 10), (2, 17), (3, 18), (4, 65)] {
            harness.put(person(id, "P", "Q", age)).await;
        }
        harness.put(person(4, "P", "Q", 66)).await;
        assert_eq!(harness.tracked_count(), 4);
        harness.verify_all().await;

        assert_eq!(harness.delete(&Query::new().lt("age", 18)).await, 2);
        harness.select_and_verify(&Query::new().gte("age", 18)).await;
        harness.verify_all().await;
    }

    #[tokio::test]
    async fn equality_fields_are_anded() {
        let conn = TestConnection::empty().await;
        conn.multi_add(
            PEOPLE,
            vec![
                Row::new().with("id", 1).with("age", 42).with("firstName", "A"),
                Row::new().with("id", 2).with("age", 42).with("firstName", "B"),
            ],
            AddOptions::default(),
        )
        .await
        .unwrap();

        let rows = conn
            .select(PEOPLE, &Query::new().eq("age", 42).eq("firstName", "B"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn range_inclusivity() {
        let conn = TestConnection::empty().await;
        let rows = [19, 20, 59, 60].map(|age| person(age, "P", "Q", age));
        conn.multi_add(PEOPLE, rows.to_vec(), AddOptions::default())
            .await
            .unwrap();

        let found = conn
            .select(PEOPLE, &Query::new().gte("age", 20).lt("age", 60))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&found), [20, 59]);
    }

    #[tokio::test]
    async fn tied_lower_bounds_are_exclusive() {
        let conn = TestConnection::empty().await;
        let rows = [29, 30, 31].map(|age| person(age, "P", "Q", age));
        conn.multi_add(PEOPLE, rows.to_vec(), AddOptions::default())
            .await
            .unwrap();

        let found = conn
            .select(PEOPLE, &Query::new().gt("age", 30).gte("age", 30))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&found), [31]);
    }

    #[tokio::test]
    async fn not_equal_excludes_every_match() {
        let conn = people_connection().await;
        let query = Query::new()
            .eq("firstName", "John")
            .eq("age", 69)
            .ne("lastName", "Gilmore");

        let rows = conn.select(PEOPLE, &query).await.unwrap();
        assert_eq!(sorted_ids(&rows), [2]);
    }

    #[tokio::test]
    async fn not_equal_alone_keeps_the_rest() {
        let conn = people_connection().await;
        let rows = conn
            .select(PEOPLE, &Query::new().ne("lastName", "Gilmore"))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&rows), [2, 4, 5, 6]);
    }

    #[tokio::test]
    async fn not_equal_on_two_fields_drops_rows_hitting_both() {
        let conn = people_connection().await;
        let query = Query::new().ne("lastName", "Gilmore").ne("firstName", "John");

        let rows = conn.select(PEOPLE, &query).await.unwrap();
        assert_eq!(sorted_ids(&rows), [2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn harness_tracks_two_field_exclusions() {
        let mut harness = IntegrationHarness::new().await;
        harness.put(person(1, "John", "Gilmore", 69)).await;
        harness.put(person(2, "John", "Doe", 69)).await;
        harness.put(person(3, "Rory", "Gilmore", 22)).await;

        let query = Query::new().ne("lastName", "Gilmore").ne("firstName", "John");
        assert_eq!(sorted_ids(&harness.select_and_verify(&query).await), [2, 3]);

        assert_eq!(harness.delete(&query).await, 2);
        harness.verify_all().await;
        assert_eq!(harness.tracked_count(), 1);
    }

    #[tokio::test]
    async fn not_equal_combines_with_range() {
        let conn = people_connection().await;
        let rows = conn
            .select(PEOPLE, &Query::new().gte("age", 17).lte("age", 69).ne("age", 69))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&rows), [3, 4, 5]);
    }

    #[tokio::test]
    async fn multi_entry_column_matches_elements() {
        let conn = people_connection().await;
        let rows = conn
            .select(PEOPLE, &Query::new().eq("tags", "student"))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&rows), [3, 4]);

        let rows = conn
            .select(PEOPLE, &Query::new().eq("tags", "student").eq("lastName", "Gilmore"))
            .await
            .unwrap();
        assert_eq!(sorted_ids(&rows), [3]);
    }

    #[tokio::test]
    async fn json_queries_equal_builder_queries() {
        let conn = people_connection().await;
        let from_json: Query = serde_json::from_value(json!({
            "firstName": "John",
            "age": {"$gte": 40, "$lt": 70},
            "lastName": {"$ne": "Gilmore"},
        }))
        .unwrap();
        let built = Query::new()
            .eq("firstName", "John")
            .gte("age", 40)
            .lt("age", 70)
            .ne("lastName", "Gilmore");
        assert_eq!(from_json, built);

        let a = conn.select(PEOPLE, &from_json).await.unwrap();
        let b = conn.select(PEOPLE, &built).await.unwrap();
        assert_eq!(sorted_ids(&a), [2, 5]);
        assert_eq!(sorted_ids(&a), sorted_ids(&b));
    }

    #[tokio::test]
    async fn upsert_twice_leaves_one_row() {
        let conn = TestConnection::empty().await;
        let row = person(7, "Lane", "Kim", 30);
        conn.add(PEOPLE, row.clone(), AddOptions::upsert()).await.unwrap();
        conn.add(PEOPLE, row, AddOptions::upsert()).await.unwrap();

        let rows = conn.select(PEOPLE, &Query::new().eq("id", 7)).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn multi_add_then_select_everything_by_key() {
        let conn = TestConnection::empty().await;
        let rows: Vec<Row> = (0..25).map(|id| person(id, "P", "Q", id % 90)).collect();
        let keys = conn
            .multi_add(PEOPLE, rows, AddOptions::default())
            .await
            .unwrap();
        assert_eq!(keys.len(), 25);

        let all = conn
            .select(PEOPLE, &Query::new().gte("id", i64::MIN))
            .await
            .unwrap();
        assert_eq!(all.len(), 25);
    }

    #[tokio::test]
    async fn delete_minors() {
        let conn = people_connection().await;
        let minors = Query::new().lt("age", 18);

        assert_eq!(conn.delete(PEOPLE, &minors).await.unwrap(), 2);
        assert!(conn.select(PEOPLE, &minors).await.unwrap().is_empty());
        let rest = conn.select(PEOPLE, &Query::new()).await.unwrap();
        assert_eq!(sorted_ids(&rest), [1, 2, 3, 5]);
    }

    #[tokio::test]
    async fn delete_on_auto_increment_table() {
        let conn = TestConnection::empty().await;
        let notes: Vec<Row> = ["a", "b", "a", "c"]
            .iter()
            .map(|&topic| Row::new().with("topic", topic))
            .collect();
        let keys = conn.multi_add(NOTES, notes, AddOptions::default()).await.unwrap();
        assert_eq!(keys.len(), 4);

        assert_eq!(conn.delete(NOTES, &Query::new().eq("topic", "a")).await.unwrap(), 2);
        let left = conn.select(NOTES, &Query::new()).await.unwrap();
        assert_eq!(sorted_ids(&left), [2, 4]);
    }

    #[tokio::test]
    async fn unknown_table_and_field() {
        let conn = people_connection().await;

        let err = conn.select("NoSuchTable", &Query::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingTable { .. }));

        let err = conn
            .select(PEOPLE, &Query::new().eq("nickname", "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnknownColumn { ref table, ref field }
                if table == PEOPLE && field == "nickname"
        ));
    }

    #[tokio::test]
    async fn empty_query_can_be_rejected() {
        let config = Config::default().empty_query(EmptyQuery::Reject);
        let conn = TestConnection::with_config(config).await;
        let err = conn.select(PEOPLE, &Query::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuery { .. }));
        let err = conn.delete(PEOPLE, &Query::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn unique_violation_is_reported_per_item() {
        let conn = people_connection().await;
        let err = conn
            .multi_add(
                PEOPLE,
                vec![
                    person(10, "X", "Y", 1).with("email", "john@doe.example"),
                    person(11, "X", "Y", 1),
                ],
                AddOptions::default(),
            )
            .await
            .unwrap_err();

        let CoreError::Batch { failures, .. } = err else {
            panic!("expected a batch error");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 0);
        assert!(matches!(
            failures[0].error,
            CoreError::Write {
                source: StorageError::Constraint { .. },
                ..
            }
        ));
        assert_eq!(conn.count(PEOPLE, &Query::new().eq("id", 11)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn closed_connection_is_not_initialized() {
        let conn = people_connection().await;
        conn.close();
        assert!(matches!(
            conn.select(PEOPLE, &Query::new()).await,
            Err(CoreError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn rows_are_copies() {
        let conn = people_connection().await;
        let mut rows = conn.select(PEOPLE, &Query::new().eq("id", 1)).await.unwrap();
        rows[0].set("age", 1);

        let again = conn.select(PEOPLE, &Query::new().eq("id", 1)).await.unwrap();
        assert_eq!(again[0].get("age"), Some(&Value::Integer(69)));
    }
}
