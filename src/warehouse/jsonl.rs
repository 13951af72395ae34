use crate::table::Table;
use crate::warehouse::writer::TableWriter;
use crate::warehouse::{LoadConfig, LoadError, LoadSummary, WarehouseLoader, WriteDisposition};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Local warehouse keeping each table in `<root>/<dataset_id>/<table_name>.jsonl`
#[derive(Debug, Clone)]
pub struct JsonLinesWarehouse {
    root: PathBuf,
}

impl JsonLinesWarehouse {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        JsonLinesWarehouse {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// File backing a table
    pub fn table_path(&self, config: &LoadConfig) -> Result<PathBuf, LoadError> {
        validate_identifier(&config.dataset_id)?;
        validate_identifier(&config.table_name)?;
        Ok(self
            .root
            .join(&config.dataset_id)
            .join(format!("{}.jsonl", config.table_name)))
    }

    fn write(&self, config: &LoadConfig, table: &Table, disposition: WriteDisposition) -> Result<LoadSummary, LoadError> {
        let path = self.table_path(config)?;
        let destination = format!("{}.{}", config.dataset_id, config.table_name);
        let io_err = |source| LoadError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut options = OpenOptions::new();
        match disposition {
            WriteDisposition::Append => options.create(true).append(true),
            WriteDisposition::Truncate => options.create(true).write(true).truncate(true),
            WriteDisposition::Empty => {
                if has_rows(&path).map_err(io_err)? {
                    return Err(LoadError::TableNotEmpty { destination });
                }
                options.create(true).append(true)
            }
        };

        let file = options.open(&path).map_err(io_err)?;
        let mut writer = TableWriter::new(BufWriter::new(file));
        let rows = writer.write_table(table).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        info!(
            rows,
            location = %config.location,
            disposition = %disposition,
            "loaded {} rows into {}",
            rows,
            destination
        );

        Ok(LoadSummary { rows, destination })
    }
}

#[async_trait]
impl WarehouseLoader for JsonLinesWarehouse {
    async fn load(
        &self,
        config: &LoadConfig,
        table: &Table,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, LoadError> {
        self.write(config, table, disposition)
    }
}

fn has_rows(path: &Path) -> std::io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Dataset and table names become path components, so keep them to one segment
fn validate_identifier(name: &str) -> Result<(), LoadError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(LoadError::InvalidIdentifier(name.to_string()))
    }
}
