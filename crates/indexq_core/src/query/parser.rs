//! Predicate parsing.
//!
//! Each field is parsed on its own. An equality gives one inclusion clause.
//! An operator set gives at most one bound clause, collapsed from
//! `$gt`/`$gte` and `$lt`/`$lte`, plus one exclusion clause for `$ne`.

use super::{Condition, Operators, Query};
use indexq_codec::Value;
use indexq_storage::KeyRange;
use std::cmp::Ordering;
use std::fmt;

/// The shape of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    /// `field == value`
    Equality,
    /// `field > value` or `field >= value`
    LowerBound,
    /// `field < value` or `field <= value`
    UpperBound,
    /// Bounded on both ends.
    Range,
    /// `field != value`. Scanned as a positive lookup of the value, then
    /// subtracted from the result.
    NotEqual,
}

/// One index scan derived from a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The field scanned.
    pub field: String,
    /// The clause shape.
    pub kind: ClauseKind,
    /// The keys to scan.
    pub range: KeyRange,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.range) {
            (ClauseKind::NotEqual, KeyRange::Only(value)) => {
                write!(f, "{} != {value:?}", self.field)
            }
            (_, range) => write!(f, "{} {range}", self.field),
        }
    }
}

/// The clauses of a query, split by role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    /// Clauses whose rows must be present.
    pub inclusions: Vec<Clause>,
    /// Clauses whose rows must be removed.
    pub exclusions: Vec<Clause>,
}

impl ParsedQuery {
    /// Returns true if the query produced no clause at all.
    pub fn is_empty(&self) -> bool {
        self.inclusions.is_empty() && self.exclusions.is_empty()
    }

    /// Iterates over every clause, inclusions first.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.inclusions.iter().chain(&self.exclusions)
    }
}

/// Parses a query into clauses.
///
/// A field whose operator set is empty contributes nothing.
pub fn parse(query: &Query) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();
    for (field, condition) in query.conditions() {
        match condition {
            Condition::Eq(value) => parsed.inclusions.push(Clause {
                field: field.clone(),
                kind: ClauseKind::Equality,
                range: KeyRange::Only(value.clone()),
            }),
            Condition::Ops(ops) => {
                if let Some(clause) = bound_clause(field, ops) {
                    parsed.inclusions.push(clause);
                }
                if let Some(value) = &ops.ne {
                    parsed.exclusions.push(Clause {
                        field: field.clone(),
                        kind: ClauseKind::NotEqual,
                        range: KeyRange::Only(value.clone()),
                    });
                }
            }
        }
    }
    parsed
}

fn bound_clause(field: &str, ops: &Operators) -> Option<Clause> {
    let lower = tighter(ops.gt.as_ref(), ops.gte.as_ref(), Ordering::Greater);
    let upper = tighter(ops.lt.as_ref(), ops.lte.as_ref(), Ordering::Less);

    let (kind, range) = match (lower, upper) {
        (Some((lower, lower_open)), Some((upper, upper_open))) => (
            ClauseKind::Range,
            KeyRange::bound(lower.clone(), upper.clone(), lower_open, upper_open),
        ),
        (Some((value, open)), None) => (
            ClauseKind::LowerBound,
            KeyRange::lower_bound(value.clone(), open),
        ),
        (None, Some((value, open))) => (
            ClauseKind::UpperBound,
            KeyRange::upper_bound(value.clone(), open),
        ),
        (None, None) => return None,
    };
    Some(Clause {
        field: field.to_string(),
        kind,
        range,
    })
}

/// Picks the tighter of an exclusive and an inclusive bound. `wins` is the
/// ordering an exclusive value must have over the inclusive one to be
/// tighter. Equal values resolve to the exclusive bound.
fn tighter<'a>(
    exclusive: Option<&'a Value>,
    inclusive: Option<&'a Value>,
    wins: Ordering,
) -> Option<(&'a Value, bool)> {
    match (exclusive, inclusive) {
        (Some(ex), Some(inc)) => {
            if ex.cmp_key(inc) == wins.reverse() {
                Some((inc, false))
            } else {
                Some((ex, true))
            }
        }
        (Some(ex), None) => Some((ex, true)),
        (None, Some(inc)) => Some((inc, false)),
        (None, None) => None,
    }
}
