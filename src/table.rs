use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Column name given to records that are not JSON objects
pub const SCALAR_COLUMN: &str = "value";

/// An in-memory table of JSON cells.
///
/// Columns are the union of every record's keys in first-seen order. Each row is
/// aligned with `columns`; a field a record did not carry is `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableData")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// Column name -> position in `columns`
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl From<TableData> for Table {
    fn from(data: TableData) -> Self {
        let mut table = Table {
            columns: data.columns,
            rows: data.rows,
            index: HashMap::new(),
        };
        table.reindex();
        table
    }
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Build a table from decoded JSON records, one row per record
    pub fn from_records<I: IntoIterator<Item = Value>>(records: I) -> Self {
        let mut table = Table::new();
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Append one record, growing the column set when it carries unseen keys
    pub fn push_record(&mut self, record: Value) {
        let fields = match record {
            Value::Object(obj) => obj,
            other => {
                let mut wrapped = Map::new();
                wrapped.insert(SCALAR_COLUMN.to_string(), other);
                wrapped
            }
        };

        let mut row = vec![Value::Null; self.columns.len()];
        for (key, value) in fields {
            let idx = match self.column_index(&key) {
                Some(idx) => idx,
                None => {
                    self.add_column(key);
                    row.push(Value::Null);
                    self.columns.len() - 1
                }
            };
            row[idx] = value;
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the cells of one column, top to bottom
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Append the rows of `other`, taking the union of both column sets
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .into_iter()
            .map(|name| match self.column_index(&name) {
                Some(idx) => idx,
                None => {
                    self.add_column(name);
                    self.columns.len() - 1
                }
            })
            .collect();

        for row in other.rows {
            let mut aligned = vec![Value::Null; self.columns.len()];
            for (value, &idx) in row.into_iter().zip(&mapping) {
                aligned[idx] = value;
            }
            self.rows.push(aligned);
        }
    }

    /// Convert rows back into JSON objects keyed by column name
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Remove a column and return its cells
    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        self.reindex();
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Append a column; `cells` must hold exactly one value per row
    pub(crate) fn push_column(&mut self, name: String, cells: Vec<Value>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        self.index.insert(name.clone(), self.columns.len());
        self.columns.push(name);
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }

    fn add_column(&mut self, name: String) {
        self.index.insert(name.clone(), self.columns.len());
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(Value::Null);
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_union_of_keys_in_first_seen_order() {
        let table = Table::from_records(vec![
            json!({"id": 1, "name": "Alice"}),
            json!({"id": 2, "email": "bob@example.com"}),
        ]);

        assert_eq!(table.columns(), &["id", "name", "email"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "email").unwrap(), &Value::Null);
        assert_eq!(table.get(1, "name").unwrap(), &Value::Null);
        assert_eq!(table.get(1, "email").unwrap(), "bob@example.com");
    }

    #[test]
    fn test_scalar_record_goes_to_value_column() {
        let table = Table::from_records(vec![json!({"id": 1}), json!("loose")]);

        assert_eq!(table.columns(), &["id", "value"]);
        assert_eq!(table.get(1, "value").unwrap(), "loose");
        assert_eq!(table.get(1, "id").unwrap(), &Value::Null);
    }

    #[test]
    fn test_append_aligns_columns() {
        let mut first = Table::from_records(vec![json!({"a": 1, "b": 2})]);
        let second = Table::from_records(vec![json!({"c": 3, "a": 4})]);

        first.append(second);

        assert_eq!(first.columns(), &["a", "b", "c"]);
        assert_eq!(first.rows()[1], vec![json!(4), Value::Null, json!(3)]);
    }

    #[test]
    fn test_column_iteration_and_records() {
        let table = Table::from_records(vec![json!({"x": 1}), json!({"x": 2})]);

        let xs: Vec<&Value> = table.column("x").unwrap().collect();
        assert_eq!(xs, vec![&json!(1), &json!(2)]);
        assert!(table.column("missing").is_none());

        let records = table.to_records();
        assert_eq!(Value::Object(records[1].clone()), json!({"x": 2}));
    }

    #[test]
    fn test_lookups_follow_column_removal() {
        let mut table = Table::from_records(vec![json!({"a": 1, "b": 2, "c": 3})]);

        assert_eq!(table.remove_column("a"), Some(vec![json!(1)]));
        table.push_column("d".to_string(), vec![json!(4)]);

        assert_eq!(table.columns(), &["b", "c", "d"]);
        assert_eq!(table.column_index("c"), Some(1));
        assert_eq!(table.column_index("a"), None);
        assert_eq!(table.get(0, "b").unwrap(), &json!(2));
        assert_eq!(table.get(0, "d").unwrap(), &json!(4));
    }

    #[test]
    fn test_deserialized_table_answers_lookups() {
        let table: Table = serde_json::from_value(json!({
            "columns": ["id", "name"],
            "rows": [[1, "Alice"]]
        }))
        .unwrap();

        assert_eq!(table.get(0, "name").unwrap(), "Alice");
        assert_eq!(table, Table::from_records(vec![json!({"id": 1, "name": "Alice"})]));
    }
}
