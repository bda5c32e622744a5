//! Key ranges for index and primary-store scans.

use indexq_codec::Value;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// A range of index keys to scan.
///
/// `open` means the bound value itself is excluded.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRange {
    /// Exactly one key.
    Only(Value),
    /// Keys above a lower bound.
    LowerBound {
        /// The bound.
        value: Value,
        /// Exclude the bound itself.
        open: bool,
    },
    /// Keys below an upper bound.
    UpperBound {
        /// The bound.
        value: Value,
        /// Exclude the bound itself.
        open: bool,
    },
    /// Keys between two bounds.
    Bound {
        /// Lower bound.
        lower: Value,
        /// Upper bound.
        upper: Value,
        /// Exclude the lower bound itself.
        lower_open: bool,
        /// Exclude the upper bound itself.
        upper_open: bool,
    },
}

impl KeyRange {
    /// A range matching exactly `value`.
    pub fn only(value: impl Into<Value>) -> Self {
        Self::Only(value.into())
    }

    /// A range of keys `>= value` (or `> value` when `open`).
    pub fn lower_bound(value: impl Into<Value>, open: bool) -> Self {
        Self::LowerBound {
            value: value.into(),
            open,
        }
    }

    /// A range of keys `<= value` (or `< value` when `open`).
    pub fn upper_bound(value: impl Into<Value>, open: bool) -> Self {
        Self::UpperBound {
            value: value.into(),
            open,
        }
    }

    /// A range with both ends.
    pub fn bound(
        lower: impl Into<Value>,
        upper: impl Into<Value>,
        lower_open: bool,
        upper_open: bool,
    ) -> Self {
        Self::Bound {
            lower: lower.into(),
            upper: upper.into(),
            lower_open,
            upper_open,
        }
    }

    /// Returns the range as `std::ops::Bound` pairs, or `None` when no key
    /// can satisfy it (inverted bounds, or equal bounds with an open end).
    pub fn bounds(&self) -> Option<(Bound<&Value>, Bound<&Value>)> {
        let pair = match self {
            Self::Only(v) => (Bound::Included(v), Bound::Included(v)),
            Self::LowerBound { value, open } => (edge(value, *open), Bound::Unbounded),
            Self::UpperBound { value, open } => (Bound::Unbounded, edge(value, *open)),
            Self::Bound {
                lower,
                upper,
                lower_open,
                upper_open,
            } => {
                match lower.cmp_key(upper) {
                    Ordering::Greater => return None,
                    Ordering::Equal if *lower_open || *upper_open => return None,
                    _ => {}
                }
                (edge(lower, *lower_open), edge(upper, *upper_open))
            }
        };
        Some(pair)
    }

    /// Returns true if `key` falls inside the range.
    pub fn contains(&self, key: &Value) -> bool {
        let Some((low, high)) = self.bounds() else {
            return false;
        };
        let above = match low {
            Bound::Included(v) => key.cmp_key(v) != Ordering::Less,
            Bound::Excluded(v) => key.cmp_key(v) == Ordering::Greater,
            Bound::Unbounded => true,
        };
        let below = match high {
            Bound::Included(v) => key.cmp_key(v) != Ordering::Greater,
            Bound::Excluded(v) => key.cmp_key(v) == Ordering::Less,
            Bound::Unbounded => true,
        };
        above && below
    }
}

fn edge(value: &Value, open: bool) -> Bound<&Value> {
    if open {
        Bound::Excluded(value)
    } else {
        Bound::Included(value)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only(v) => write!(f, "= {v:?}"),
            Self::LowerBound { value, open } => {
                write!(f, "{} {value:?}", if *open { ">" } else { ">=" })
            }
            Self::UpperBound { value, open } => {
                write!(f, "{} {value:?}", if *open { "<" } else { "<=" })
            }
            Self::Bound {
                lower,
                upper,
                lower_open,
                upper_open,
            } => write!(
                f,
                "{}{lower:?}, {upper:?}{}",
                if *lower_open { "(" } else { "[" },
                if *upper_open { ")" } else { "]" }
            ),
        }
    }
}
