//! Per-column type profiles used to detect nested columns
//!
//! A profile counts the JSON types seen in a column over a scanned prefix of
//! rows. Detection built on it is a heuristic: a column whose scanned cells are
//! all scalars is never reported, whatever the remaining rows hold.

use crate::flatten::types::NestedScan;
use crate::table::Table;
use serde_json::Value;
use std::collections::HashMap;

/// Type identifier for JSON values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    JsonType::Integer
                } else {
                    JsonType::Number
                }
            }
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

/// Type counts for one column
#[derive(Debug, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub scanned: usize,
    counts: HashMap<JsonType, usize>,
}

impl ColumnProfile {
    fn new(name: String) -> Self {
        ColumnProfile {
            name,
            scanned: 0,
            counts: HashMap::new(),
        }
    }

    fn add_value(&mut self, value: &Value) {
        self.scanned += 1;
        *self.counts.entry(JsonType::from_value(value)).or_insert(0) += 1;
    }

    pub fn count(&self, json_type: JsonType) -> usize {
        self.counts.get(&json_type).copied().unwrap_or(0)
    }

    /// Whether any scanned cell was an object
    pub fn is_nested(&self) -> bool {
        self.count(JsonType::Object) > 0
    }

    /// Most frequent non-null type, if any non-null cell was seen
    pub fn dominant_type(&self) -> Option<JsonType> {
        self.counts
            .iter()
            .filter(|(t, _)| **t != JsonType::Null)
            .max_by_key(|(t, count)| (**count, std::cmp::Reverse(t.as_str())))
            .map(|(t, _)| *t)
    }
}

/// Profile every column of `table` over the rows selected by `scan`
pub fn profile_columns(table: &Table, scan: NestedScan) -> Vec<ColumnProfile> {
    let mut profiles: Vec<ColumnProfile> = table
        .columns()
        .iter()
        .cloned()
        .map(ColumnProfile::new)
        .collect();

    for row in table.rows().iter().take(scan.limit(table.len())) {
        for (profile, value) in profiles.iter_mut().zip(row) {
            profile.add_value(value);
        }
    }

    profiles
}

/// Names of the columns that look nested, in table column order.
///
/// The result is a proposal: callers may edit it before passing it to `flatten`.
pub fn detect_nested_columns(table: &Table, scan: NestedScan) -> Vec<String> {
    profile_columns(table, scan)
        .into_iter()
        .filter(ColumnProfile::is_nested)
        .map(|p| p.name)
        .collect()
}
