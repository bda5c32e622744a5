//! A naive query evaluator.
//!
//! Checks every row against every condition directly, without indexes,
//! bound collapsing or merging. Property tests compare
//! [`indexq_core::Connection::select`] against it.
//!
//! The oracle follows index semantics: a row whose field is missing or not
//! indexable never satisfies an inclusion, and values compare by
//! [`Value::cmp_key`]. Multi-entry fields are not modelled.
//!
//! Exclusions combine the way the merger combines them: a row is dropped only
//! when it hits every `$ne` of the query.

use indexq_codec::{Row, Value};
use indexq_core::{Condition, Operators, Query};
use std::cmp::Ordering;

/// Returns the rows of `rows` that satisfy `query`, in input order.
pub fn evaluate(rows: &[Row], query: &Query) -> Vec<Row> {
    rows.iter().filter(|row| matches(row, query)).cloned().collect()
}

/// Returns true if `row` satisfies the inclusions of `query` and is not
/// excluded by it.
pub fn matches(row: &Row, query: &Query) -> bool {
    let conditions = query.conditions();
    let included = conditions
        .iter()
        .all(|(field, condition)| satisfies(indexed(row, field), condition));

    let exclusions: Vec<(&String, &Value)> = conditions
        .iter()
        .filter_map(|(field, condition)| match condition {
            Condition::Ops(Operators { ne: Some(ne), .. }) => Some((field, ne)),
            _ => None,
        })
        .collect();
    let excluded = !exclusions.is_empty()
        && exclusions.iter().all(|(field, ne)| {
            indexed(row, field).is_some_and(|v| v.cmp_key(ne) == Ordering::Equal)
        });

    included && !excluded
}

fn indexed<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    row.get(field).filter(|v| v.is_indexable())
}

fn satisfies(value: Option<&Value>, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(expected) => value.is_some_and(|v| v.cmp_key(expected) == Ordering::Equal),
        Condition::Ops(ops) => in_bounds(value, ops),
    }
}

fn in_bounds(value: Option<&Value>, ops: &Operators) -> bool {
    if ops.gt.is_none() && ops.gte.is_none() && ops.lt.is_none() && ops.lte.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    let holds = |bound: &Option<Value>, accept: fn(Ordering) -> bool| {
        bound.as_ref().map_or(true, |b| accept(value.cmp_key(b)))
    };
    holds(&ops.gt, Ordering::is_gt)
        && holds(&ops.gte, Ordering::is_ge)
        && holds(&ops.lt, Ordering::is_lt)
        && holds(&ops.lte, Ordering::is_le)
}
