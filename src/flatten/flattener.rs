use crate::flatten::profile::detect_nested_columns;
use crate::flatten::types::{FlattenConfig, FlattenError, NestedScan};
use crate::table::{Table, SCALAR_COLUMN};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Expands nested JSON object columns into flat sibling columns
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    config: FlattenConfig,
}

impl Flattener {
    pub fn new(config: FlattenConfig) -> Self {
        Flattener { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Flatten the named columns.
    ///
    /// Each cell is normalized first: objects are kept, null becomes `{}`, and any
    /// other value becomes `{"value": v}`. Every key of the normalized objects then
    /// becomes a column `<column><separator><key>`, appended after the existing
    /// columns. The original column is dropped. Row count and order are preserved.
    /// A column named more than once is flattened once.
    pub fn flatten<S: AsRef<str>>(&self, mut table: Table, columns: &[S]) -> Result<Table, FlattenError> {
        if let Some(missing) = columns.iter().find(|c| !table.has_column(c.as_ref())) {
            return Err(FlattenError::ColumnNotFound {
                column: missing.as_ref().to_string(),
            });
        }

        let mut done: HashSet<&str> = HashSet::new();
        for column in columns {
            let column = column.as_ref();
            if !done.insert(column) {
                continue;
            }
            info!(column, "flattening column");

            let cells = table
                .remove_column(column)
                .ok_or_else(|| FlattenError::ColumnNotFound {
                    column: column.to_string(),
                })?;

            for (name, values) in self.expand_column(column, cells)? {
                if table.has_column(&name) {
                    return Err(FlattenError::ColumnCollision { column: name });
                }
                table.push_column(name, values);
            }
        }

        Ok(table)
    }

    /// Flatten the columns found nested by the configured scan
    pub fn auto_flatten(&self, table: Table) -> Result<Table, FlattenError> {
        self.auto_flatten_with(table, self.config.scan)
    }

    pub fn auto_flatten_with(&self, table: Table, scan: NestedScan) -> Result<Table, FlattenError> {
        let nested = detect_nested_columns(&table, scan);
        self.flatten(table, &nested)
    }

    /// Expand one column's cells into `(name, cells)` pairs, keys in first-seen order
    fn expand_column(&self, column: &str, cells: Vec<Value>) -> Result<Vec<(String, Vec<Value>)>, FlattenError> {
        let row_count = cells.len();
        let mut names: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut columns: Vec<Vec<Value>> = Vec::new();

        for (row, cell) in cells.into_iter().enumerate() {
            let mut flat = Map::new();
            self.flatten_object(column, normalize(cell), None, 0, &mut flat)?;

            for (key, value) in flat {
                let idx = match index.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        index.insert(key.clone(), names.len());
                        names.push(key);
                        columns.push(vec![Value::Null; row_count]);
                        names.len() - 1
                    }
                };
                columns[idx][row] = value;
            }
        }

        Ok(names
            .into_iter()
            .map(|key| format!("{}{}{}", column, self.config.separator, key))
            .zip(columns)
            .collect())
    }

    /// Copy an object's fields into `out`, descending into nested objects up to `max_level`.
    ///
    /// A nested path and a literal key can join to the same name (`a` > `b` and
    /// `"a.b"`); that is a collision, not an overwrite.
    fn flatten_object(
        &self,
        column: &str,
        obj: Map<String, Value>,
        prefix: Option<&str>,
        level: usize,
        out: &mut Map<String, Value>,
    ) -> Result<(), FlattenError> {
        for (key, value) in obj {
            let name = match prefix {
                Some(p) => format!("{}{}{}", p, self.config.nested_separator, key),
                None => key,
            };

            match value {
                Value::Object(inner) if level < self.config.max_level => {
                    self.flatten_object(column, inner, Some(&name), level + 1, out)?;
                }
                other => {
                    if out.contains_key(&name) {
                        return Err(FlattenError::ColumnCollision {
                            column: format!("{}{}{}", column, self.config.separator, name),
                        });
                    }
                    out.insert(name, other);
                }
            }
        }
        Ok(())
    }
}

fn normalize(cell: Value) -> Map<String, Value> {
    match cell {
        Value::Object(obj) => obj,
        Value::Null => Map::new(),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert(SCALAR_COLUMN.to_string(), other);
            wrapped
        }
    }
}
