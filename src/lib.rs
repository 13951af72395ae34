//! # pipeline-tools - SaaS API to warehouse toolkit
//!
//! Utilities for data pipelines that pull paginated JSON from SaaS APIs
//! (Harvest, Hibob, Pipedrive, Forecast), flatten it into tables and load the
//! result into a warehouse.
//!
//! ## Modules
//!
//! - **fetch**: bounded-concurrency batch fetching of numbered pages
//! - **flatten**: expand nested JSON object columns into flat columns
//! - **auth**: credentials providers and per-integration headers
//! - **warehouse**: load tables with a write disposition
//! - **holiday**: English bank holidays with weekend shifting
//!
//! ## Quick Start
//!
//! ```rust
//! use pipeline_tools::{auto_flatten, Table};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), pipeline_tools::PipelineError> {
//! let table = Table::from_records(vec![
//!     json!({"id": 1, "client": {"id": 10, "name": "Acme"}}),
//!     json!({"id": 2, "client": {"id": 11, "name": "Globex"}}),
//! ]);
//!
//! let flat = auto_flatten(table)?;
//! assert_eq!(flat.columns(), &["id", "client_id", "client_name"]);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod holiday;
pub mod table;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{load_config, PipelineConfig};
pub use error::PipelineError;
pub use fetch::{fetch_all, BatchFetcher, FetchConfig, Headers, HttpJsonSource, JsonSource};
pub use flatten::{auto_flatten, detect_nested_columns, flatten, Flattener, FlattenConfig, NestedScan};
pub use table::Table;
pub use warehouse::{JsonLinesWarehouse, LoadConfig, WarehouseLoader, WriteDisposition};
