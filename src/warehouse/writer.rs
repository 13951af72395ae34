use crate::table::Table;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Writes table rows as newline-delimited JSON objects
pub struct TableWriter<W: Write> {
    writer: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        TableWriter { writer }
    }

    /// Write every row, returning how many were written
    pub fn write_table(&mut self, table: &Table) -> io::Result<usize> {
        for row in table.rows() {
            let record: Map<String, Value> = table
                .columns()
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(table.len())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
