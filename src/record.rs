//! Field records: the key/value data one report is generated from.
//!
//! A [`FieldRecord`] is the merge of one station-profile row and one
//! billing-period row. Placeholder rules are emitted in field order, so the
//! record is backed by an [`IndexMap`]: iteration order is insertion order,
//! deterministic for the lifetime of the record. Overwriting a key during a
//! merge keeps the key's original position.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar cell value as it arrives from the spreadsheet.
///
/// Worksheet cells are strings or numbers; absent trailing cells in a row
/// come through as [`Value::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Empty,
}

impl Value {
    /// True for [`Value::Empty`] and for blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Empty => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Render a number the way it should appear in a filled report: whole values
/// without a trailing `.0`, fractional values as-is.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Ordered mapping from field name to scalar value.
///
/// Every key present here is addressable as the `$<key>` placeholder in the
/// report template. Keys absent from the record leave their placeholders
/// unresolved — that is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord(IndexMap<String, Value>);

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field. Overwriting keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String form of a field, or `None` when the key is absent.
    ///
    /// A present-but-empty field yields `Some("")` — the distinction matters
    /// to the derived evaluation flags.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(Value::to_string)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`; on key conflict `other` wins.
    pub fn merge(&mut self, other: &FieldRecord) {
        for (key, value) in other.iter() {
            self.0.insert(key.to_string(), value.clone());
        }
    }
}

impl FromIterator<(String, Value)> for FieldRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
