//! Row type.

use crate::error::{CodecError, CodecResult};
use crate::value::{cmp_fields, Value};
use std::cmp::Ordering;

/// A stored row: an ordered set of named fields.
///
/// Only the table's key column is required; every other field is optional
/// and fields that are not declared as columns are stored but cannot be
/// queried. Equality ignores field order.
#[derive(Debug, Clone, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from fields. Later duplicates of a name replace earlier ones.
    #[must_use]
    pub fn from_fields(fields: Vec<(String, Value)>) -> Self {
        let mut row = Self::new();
        for (name, value) in fields {
            row.set(name, value);
        }
        row
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, returning the previous value if there was one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Returns the value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Returns true if the row has the given field.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the fields as a slice.
    pub fn as_slice(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the row into a map value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        cmp_fields(&self.fields, &other.fields) == Ordering::Equal
    }
}

impl Eq for Row {}

impl TryFrom<Value> for Row {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Map(fields) => Ok(Row::from_fields(fields)),
            other => Err(CodecError::unexpected_type("map", other.type_name())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}
