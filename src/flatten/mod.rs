//! Flattening of nested JSON columns
//!
//! Tables built from API records often carry columns whose cells are whole JSON
//! objects (an owner, a client, a budget). Flattening expands each such column
//! into one column per key, named `<column>_<key>`, so the table can be loaded
//! into a warehouse with a flat schema.

pub mod flattener;
pub mod profile;
pub mod types;

pub use flattener::Flattener;
pub use profile::{detect_nested_columns, profile_columns, ColumnProfile, JsonType};
pub use types::{FlattenConfig, FlattenError, NestedScan};

use crate::table::Table;

/// Flatten the named columns with the default configuration
pub fn flatten<S: AsRef<str>>(table: Table, columns: &[S]) -> Result<Table, FlattenError> {
    Flattener::default().flatten(table, columns)
}

/// Flatten every column whose first-row value is an object
pub fn auto_flatten(table: Table) -> Result<Table, FlattenError> {
    Flattener::default().auto_flatten(table)
}
