//! Loading flat tables into a warehouse
//!
//! `WarehouseLoader` is the boundary between the pipeline and wherever tables
//! end up. `JsonLinesWarehouse` is a local implementation that keeps one
//! JSON-lines file per table.

pub mod jsonl;
pub mod writer;

pub use jsonl::JsonLinesWarehouse;
pub use writer::TableWriter;

use crate::table::Table;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a table is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    pub dataset_id: String,
    pub table_name: String,
    pub location: String,
}

/// How a load treats rows already in the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteDisposition {
    #[default]
    #[serde(rename = "WRITE_APPEND")]
    Append,
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
    /// Only write into an empty table
    #[serde(rename = "WRITE_EMPTY")]
    Empty,
}

impl WriteDisposition {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteDisposition::Append => "WRITE_APPEND",
            WriteDisposition::Truncate => "WRITE_TRUNCATE",
            WriteDisposition::Empty => "WRITE_EMPTY",
        }
    }
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteDisposition {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WRITE_APPEND" | "APPEND" => Ok(WriteDisposition::Append),
            "WRITE_TRUNCATE" | "TRUNCATE" | "OVERWRITE" => Ok(WriteDisposition::Truncate),
            "WRITE_EMPTY" | "EMPTY" => Ok(WriteDisposition::Empty),
            _ => Err(LoadError::InvalidDisposition(s.to_string())),
        }
    }
}

/// Result of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    /// `dataset.table`
    pub destination: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("table {destination} already contains data")]
    TableNotEmpty { destination: String },

    #[error("invalid write disposition: {0}")]
    InvalidDisposition(String),

    #[error("invalid dataset or table name: '{0}'")]
    InvalidIdentifier(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    async fn load(
        &self,
        config: &LoadConfig,
        table: &Table,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_parsing() {
        assert_eq!("WRITE_APPEND".parse::<WriteDisposition>().unwrap(), WriteDisposition::Append);
        assert_eq!("overwrite".parse::<WriteDisposition>().unwrap(), WriteDisposition::Truncate);
        assert_eq!("write_empty".parse::<WriteDisposition>().unwrap(), WriteDisposition::Empty);
        assert!("merge".parse::<WriteDisposition>().is_err());
        assert_eq!(WriteDisposition::Truncate.to_string(), "WRITE_TRUNCATE");
    }
}
