//! Top-level error type wrapping each module's errors

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::flatten::FlattenError;
use crate::warehouse::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("flatten error: {0}")]
    Flatten(#[from] FlattenError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
