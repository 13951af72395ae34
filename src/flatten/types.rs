use serde::{Deserialize, Serialize};

/// How many rows to inspect when deciding which columns hold nested objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedScan {
    /// Only the first row. Misses columns whose first cell happens to be a scalar.
    #[default]
    FirstRow,
    /// The first `n` rows
    Sample(usize),
    /// Every row
    All,
}

impl NestedScan {
    /// Number of rows to scan in a table of `len` rows
    pub fn limit(self, len: usize) -> usize {
        match self {
            NestedScan::FirstRow => len.min(1),
            NestedScan::Sample(n) => len.min(n),
            NestedScan::All => len,
        }
    }
}

/// Configuration for the flattening process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Separator between the original column name and a nested key
    pub separator: String,

    /// Separator between nested keys below the first level
    pub nested_separator: String,

    /// Extra object levels to expand below the first (0 = one level only)
    pub max_level: usize,

    /// Rows inspected by auto-detection
    pub scan: NestedScan,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("_"),
            nested_separator: String::from("."),
            max_level: 0,
            scan: NestedScan::FirstRow,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("flattened column '{column}' already exists in the table")]
    ColumnCollision { column: String },
}
