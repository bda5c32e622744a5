//! Queries and their evaluation.
//!
//! A [`Query`] maps field names to a [`Condition`]. Evaluation runs in three
//! steps:
//! - [`parse`] turns the query into inclusion and exclusion clauses
//! - the scan executor runs one index scan per clause in a shared read
//!   transaction
//! - [`merge`] intersects the inclusion batches and subtracts the
//!   exclusion batches by row content

pub mod merge;
mod parser;
pub(crate) mod scan;

pub use merge::merge;
pub use parser::{parse, Clause, ClauseKind, ParsedQuery};

use indexq_codec::{CodecError, Value};
use serde::de::{self, Deserialize, Deserializer};

/// Comparison operators on one field.
///
/// Any subset may be given. `gt`/`gte` and `lt`/`lte` collapse into one
/// range; `ne` becomes a separate exclusion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operators {
    /// `$lt`
    pub lt: Option<Value>,
    /// `$lte`
    pub lte: Option<Value>,
    /// `$gt`
    pub gt: Option<Value>,
    /// `$gte`
    pub gte: Option<Value>,
    /// `$ne`
    pub ne: Option<Value>,
}

impl Operators {
    /// Returns true if no operator is set.
    pub fn is_empty(&self) -> bool {
        self.lt.is_none()
            && self.lte.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
            && self.ne.is_none()
    }

    fn from_fields(fields: Vec<(String, Value)>) -> Self {
        let mut ops = Self::default();
        for (name, value) in fields {
            match name.as_str() {
                "$lt" => ops.lt = Some(value),
                "$lte" => ops.lte = Some(value),
                "$gt" => ops.gt = Some(value),
                "$gte" => ops.gte = Some(value),
                "$ne" => ops.ne = Some(value),
                _ => {}
            }
        }
        ops
    }
}

/// The condition a query places on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field equals the value.
    Eq(Value),
    /// The field satisfies every given operator.
    Ops(Operators),
}

impl From<Value> for Condition {
    /// Maps become operator objects; anything else is an equality.
    fn from(value: Value) -> Self {
        match value {
            Value::Map(fields) => Self::Ops(Operators::from_fields(fields)),
            other => Self::Eq(other),
        }
    }
}

/// A conjunction of per-field conditions.
///
/// Build one with the methods below, or deserialize it from the object
/// syntax `{"age": {"$gte": 20, "$lt": 60}, "name": "Ann"}`.
///
/// ```rust
/// use indexq_core::Query;
///
/// let query = Query::new().gte("age", 20).lt("age", 60).eq("name", "Ann");
/// assert_eq!(query.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    conditions: Vec<(String, Condition)>,
}

impl Query {
    /// Creates a query with no conditions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the condition on `field`, replacing any previous one.
    #[must_use]
    pub fn condition(mut self, field: impl Into<String>, condition: Condition) -> Self {
        let field = field.into();
        match self.conditions.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = condition,
            None => self.conditions.push((field, condition)),
        }
        self
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, Condition::Eq(value.into()))
    }

    /// Sets all operators on `field` at once.
    #[must_use]
    pub fn ops(self, field: impl Into<String>, ops: Operators) -> Self {
        self.condition(field, Condition::Ops(ops))
    }

    /// Requires `field < value`.
    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_op(field, |ops| ops.lt = Some(value.into()))
    }

    /// Requires `field <= value`.
    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_op(field, |ops| ops.lte = Some(value.into()))
    }

    /// Requires `field > value`.
    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_op(field, |ops| ops.gt = Some(value.into()))
    }

    /// Requires `field >= value`.
    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_op(field, |ops| ops.gte = Some(value.into()))
    }

    /// Requires `field != value`.
    #[must_use]
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_op(field, |ops| ops.ne = Some(value.into()))
    }

    // An equality already on the field is replaced by the single operator.
    fn with_op(self, field: impl Into<String>, set: impl FnOnce(&mut Operators)) -> Self {
        let field = field.into();
        let mut ops = match self.conditions.iter().find(|(name, _)| *name == field) {
            Some((_, Condition::Ops(ops))) => ops.clone(),
            _ => Operators::default(),
        };
        set(&mut ops);
        self.condition(field, Condition::Ops(ops))
    }

    /// Returns the conditions in insertion order.
    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    /// Returns the number of constrained fields.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true if no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl PartialEq for Query {
    /// Field order does not matter.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.conditions.iter().all(|(field, condition)| {
                other
                    .conditions
                    .iter()
                    .any(|(name, c)| name == field && c == condition)
            })
    }
}

impl TryFrom<Value> for Query {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(fields) => Ok(Self {
                conditions: fields
                    .into_iter()
                    .map(|(name, value)| (name, Condition::from(value)))
                    .collect(),
            }),
            other => Err(CodecError::unexpected_type("map", other.type_name())),
        }
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_merges_operators_per_field() {
        let query = Query::new().gte("age", 20).lt("age", 60).ne("age", 42);
        assert_eq!(query.len(), 1);
        assert_eq!(
            query.conditions()[0].1,
            Condition::Ops(Operators {
                lt: Some(Value::Integer(60)),
                gte: Some(Value::Integer(20)),
                ne: Some(Value::Integer(42)),
                ..Operators::default()
            })
        );
    }

    #[test]
    fn later_condition_replaces_earlier() {
        let query = Query::new().eq("age", 1).gt("age", 5);
        assert!(matches!(&query.conditions()[0].1, Condition::Ops(ops) if ops.gt.is_some()));

        let query = Query::new().gt("age", 5).eq("age", 1);
        assert_eq!(query.conditions()[0].1, Condition::Eq(Value::Integer(1)));
    }

    #[test]
    fn deserializes_object_syntax() {
        let query: Query = serde_json::from_value(json!({
            "firstName": "John",
            "age": 69,
            "lastName": {"$ne": "Gilmore"},
        }))
        .unwrap();

        let expected = Query::new()
            .eq("firstName", "John")
            .eq("age", 69)
            .ne("lastName", "Gilmore");
        assert_eq!(query, expected);
    }

    #[test]
    fn unknown_operators_are_ignored() {
        let query: Query = serde_json::from_value(json!({"age": {"$between": [1, 2]}})).unwrap();
        assert!(matches!(&query.conditions()[0].1, Condition::Ops(ops) if ops.is_empty()));
    }

    #[test]
    fn null_is_an_equality() {
        let query: Query = serde_json::from_value(json!({"age": null})).unwrap();
        assert_eq!(query.conditions()[0].1, Condition::Eq(Value::Null));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(serde_json::from_value::<Query>(json!([1, 2])).is_err());
        assert!(Query::try_from(Value::Integer(3)).is_err());
    }
}
