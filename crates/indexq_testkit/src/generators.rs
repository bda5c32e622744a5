//! Property-based test generators using proptest.
//!
//! Values are drawn from a small domain so that equalities and range
//! boundaries actually hit stored rows.

use indexq_codec::{Row, Value};
use indexq_core::{Condition, Operators, Query};
use proptest::prelude::*;

/// Fields the generated rows and queries use. `id` is the key.
pub const FIELDS: [&str; 3] = ["id", "age", "name"];

/// Strategy for an indexable field value.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        6 => (0i64..10).prop_map(Value::Integer),
        1 => (0i64..10).prop_map(|n| Value::Float(n as f64 + 0.5)),
        3 => prop::sample::select(vec!["a", "b", "c"]).prop_map(Value::from),
        1 => Just(Value::Null),
    ]
}

/// Strategy for rows with distinct integer keys `0..len`.
///
/// Each non-key field is either absent or holds a generated value.
pub fn rows_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            prop::option::of(value_strategy()),
            prop::option::of(value_strategy()),
        ),
        0..max_rows,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(id, (age, name))| {
                let mut row = Row::new().with("id", id as i64);
                if let Some(age) = age {
                    row.set("age", age);
                }
                if let Some(name) = name {
                    row.set("name", name);
                }
                row
            })
            .collect()
    })
}

/// Strategy for an operator set with any subset of operators.
pub fn operators_strategy() -> impl Strategy<Value = Operators> {
    (
        prop::option::of(value_strategy()),
        prop::option::of(value_strategy()),
        prop::option::of(value_strategy()),
        prop::option::of(value_strategy()),
        prop::option::of(value_strategy()),
    )
        .prop_map(|(lt, lte, gt, gte, ne)| Operators {
            lt,
            lte,
            gt,
            gte,
            ne,
        })
}

/// Strategy for a condition on one field.
pub fn condition_strategy() -> impl Strategy<Value = Condition> {
    prop_oneof![
        value_strategy().prop_map(Condition::Eq),
        operators_strategy().prop_map(Condition::Ops),
    ]
}

/// Strategy for a query over [`FIELDS`].
pub fn query_strategy() -> impl Strategy<Value = Query> {
    prop::collection::vec((prop::sample::select(FIELDS.to_vec()), condition_strategy()), 0..4)
        .prop_map(|conditions| {
            conditions
                .into_iter()
                .fold(Query::new(), |query, (field, condition)| {
                    query.condition(field, condition)
                })
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
