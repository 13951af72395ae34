//! Pipeline configuration
//!
//! Uses `figment` for layered configuration: defaults -> TOML file -> environment.
//! Environment variables are prefixed `PIPELINE_` and nest with `__`, e.g.
//! `PIPELINE_FETCH__BATCH_SIZE=20`. Binaries apply CLI overrides on top.

use crate::fetch::FetchConfig;
use crate::flatten::FlattenConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub flatten: FlattenConfig,
    pub warehouse: WarehouseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Root directory of the local JSON-lines warehouse
    pub root: PathBuf,
    pub location: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig {
            root: PathBuf::from("warehouse"),
            location: String::from("EU"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Load configuration from defaults, an optional TOML file and the environment
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(env_provider());

    figment.extract().map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })
}

/// `PIPELINE_*` variables, minus the `PIPELINE_SECRET_*` ones read by `EnvCredentials`
fn env_provider() -> Env {
    Env::prefixed("PIPELINE_")
        .filter(|key| !key.as_str().to_ascii_lowercase().starts_with("secret_"))
        .split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageErrorPolicy;
    use crate::flatten::NestedScan;
    use std::io::Write;

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[fetch]
batch_size = 25
on_page_error = "skip"

[flatten]
scan = {{ sample = 50 }}

[warehouse]
location = "US"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.fetch.batch_size, 25);
        assert_eq!(config.fetch.on_page_error, PageErrorPolicy::Skip);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.flatten.scan, NestedScan::Sample(50));
        assert_eq!(config.flatten.separator, "_");
        assert_eq!(config.warehouse.location, "US");
    }

    #[test]
    fn test_secrets_stay_out_of_config() {
        std::env::set_var("PIPELINE_SECRET_CONFIG_TEST_TOKEN", "hunter2");

        let keys: Vec<String> = env_provider()
            .iter()
            .map(|(key, _)| key.as_str().to_ascii_lowercase())
            .collect();

        assert!(!keys.iter().any(|k| k.starts_with("secret")), "{:?}", keys);
        std::env::remove_var("PIPELINE_SECRET_CONFIG_TEST_TOKEN");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
