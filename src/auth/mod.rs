//! Credentials and per-integration request headers

pub mod credentials;
pub mod headers;

pub use credentials::{
    AuthError, CachedCredentials, CredentialsProvider, EnvCredentials, StaticCredentials,
    ENV_SECRET_PREFIX,
};
pub use headers::{forecast_headers, harvest_headers, hibob_headers, pipedrive_access_token};
