//! Result merging.
//!
//! Rows are compared by content, never by identity: two rows are the same
//! row when their canonical encodings are equal. This lets batches from
//! different index scans that point at the same stored row line up.

use crate::error::CoreResult;
use indexq_codec::{encode_row, Row};
use std::collections::HashSet;
use tracing::debug;

/// Canonical encoding of a row, used as its identity during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RowKey(Vec<u8>);

impl RowKey {
    fn of(row: &Row) -> CoreResult<Self> {
        Ok(Self(encode_row(row)?))
    }
}

fn key_set(batch: &[Row]) -> CoreResult<HashSet<RowKey>> {
    batch.iter().map(RowKey::of).collect()
}

/// Combines scan batches into the final result.
///
/// The result holds the rows present in every inclusion batch and absent
/// from the intersection of the exclusion batches, in the order they first
/// appear in the first inclusion batch. With no exclusions and at most one
/// inclusion batch, that batch is returned as is.
///
/// # Errors
///
/// Returns [`crate::CoreError::Codec`] if a row cannot be encoded.
pub fn merge(inclusions: Vec<Vec<Row>>, exclusions: Vec<Vec<Row>>) -> CoreResult<Vec<Row>> {
    if exclusions.is_empty() && inclusions.len() <= 1 {
        return Ok(inclusions.into_iter().next().unwrap_or_default());
    }

    let mut batches = inclusions.into_iter();
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for row in batches.next().unwrap_or_default() {
        let key = RowKey::of(&row)?;
        if seen.insert(key.clone()) {
            result.push((key, row));
        }
    }
    for batch in batches {
        if result.is_empty() {
            break;
        }
        let keys = key_set(&batch)?;
        result.retain(|(key, _)| keys.contains(key));
    }

    let mut exclusions = exclusions.into_iter();
    if let Some(first) = exclusions.next() {
        let mut excluded = key_set(&first)?;
        for batch in exclusions {
            if excluded.is_empty() {
                break;
            }
            let keys = key_set(&batch)?;
            excluded.retain(|key| keys.contains(key));
        }
        result.retain(|(key, _)| !excluded.contains(key));
    }

    debug!(rows = result.len(), "merged scan batches");
    Ok(result.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: i64, name: &str) -> Row {
        Row::new().with("id", id).with("age", age).with("name", name)
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .map(|r| r.get("id").and_then(|v| v.as_integer()).unwrap())
            .collect()
    }

    #[test]
    fn single_batch_is_returned_directly() {
        let batch = vec![person(1, 42, "A"), person(1, 42, "A")];
        assert_eq!(merge(vec![batch], vec![]).unwrap().len(), 2);
        assert!(merge(vec![], vec![]).unwrap().is_empty());
    }

    #[test]
    fn inclusions_intersect_by_content() {
        let by_age = vec![person(1, 42, "A"), person(2, 42, "B")];
        let by_name = vec![person(2, 42, "B")];
        assert_eq!(ids(&merge(vec![by_age, by_name], vec![]).unwrap()), [2]);
    }

    #[test]
    fn field_order_does_not_affect_identity() {
        let a = person(1, 42, "A");
        let b = Row::new().with("name", "A").with("id", 1).with("age", 42.0);
        assert_eq!(merge(vec![vec![a], vec![b]], vec![]).unwrap().len(), 1);
    }

    #[test]
    fn empty_batch_empties_the_result() {
        let rows = vec![person(1, 42, "A")];
        let result = merge(vec![rows.clone(), vec![], rows], vec![]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn exclusions_are_subtracted() {
        let inclusions = vec![
            vec![person(1, 69, "Gilmore"), person(2, 69, "Smith")],
            vec![person(1, 69, "Gilmore"), person(2, 69, "Smith"), person(3, 20, "Gilmore")],
        ];
        let exclusions = vec![vec![person(1, 69, "Gilmore"), person(3, 20, "Gilmore")]];
        assert_eq!(ids(&merge(inclusions, exclusions).unwrap()), [2]);
    }

    #[test]
    fn exclusion_batches_intersect_first() {
        let inclusions = vec![vec![person(1, 1, "A"), person(2, 2, "B"), person(3, 3, "C")]];
        let exclusions = vec![
            vec![person(1, 1, "A"), person(2, 2, "B")],
            vec![person(2, 2, "B"), person(3, 3, "C")],
        ];
        assert_eq!(ids(&merge(inclusions, exclusions).unwrap()), [1, 3]);
    }

    #[test]
    fn duplicates_collapse_when_merging() {
        let batch = vec![person(1, 1, "A"), person(2, 2, "B"), person(1, 1, "A")];
        let result = merge(vec![batch.clone(), batch], vec![]).unwrap();
        assert_eq!(ids(&result), [1, 2]);
    }
}
