//! Secret lookup for API credentials
//!
//! Providers are injected into whatever needs a secret instead of being called
//! ad hoc:
//! - `EnvCredentials`: reads secrets from environment variables.
//! - `StaticCredentials`: in-memory map, for tests and embedding.
//! - `CachedCredentials`: wraps another provider, fetching each secret once and
//!   refetching after a TTL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default prefix for secrets read from the environment
pub const ENV_SECRET_PREFIX: &str = "PIPELINE_SECRET_";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("secret not found: {secret_id}")]
    NotFound { secret_id: String },

    #[error("secret backend unavailable: {message}")]
    BackendUnavailable { message: String },
}

/// A source of named secrets
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn secret(&self, secret_id: &str) -> Result<String, AuthError>;
}

/// Reads secret `X` from the environment variable `<prefix>X`
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    prefix: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_prefix(ENV_SECRET_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn var_name(&self, secret_id: &str) -> String {
        format!("{}{}", self.prefix, secret_id)
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialsProvider for EnvCredentials {
    async fn secret(&self, secret_id: &str) -> Result<String, AuthError> {
        let var = self.var_name(secret_id);
        std::env::var(&var).map_err(|e| match e {
            std::env::VarError::NotPresent => AuthError::NotFound {
                secret_id: secret_id.to_string(),
            },
            std::env::VarError::NotUnicode(_) => AuthError::BackendUnavailable {
                message: format!("{} is not valid unicode", var),
            },
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, secret_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticCredentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            secrets: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn secret(&self, secret_id: &str) -> Result<String, AuthError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| AuthError::NotFound {
                secret_id: secret_id.to_string(),
            })
    }
}

struct CachedSecret {
    value: String,
    fetched_at: Instant,
}

/// Caches secrets from an inner provider until they are older than `ttl`
pub struct CachedCredentials<P> {
    inner: P,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedSecret>>,
}

impl<P: CredentialsProvider> CachedCredentials<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop one cached secret so the next lookup refetches it
    pub fn invalidate(&self, secret_id: &str) {
        self.lock().remove(secret_id);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lookup(&self, secret_id: &str) -> Option<String> {
        let mut cache = self.lock();
        match cache.get(secret_id) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                debug!(secret_id, "cached secret expired");
                cache.remove(secret_id);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedSecret>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<P: CredentialsProvider> CredentialsProvider for CachedCredentials<P> {
    async fn secret(&self, secret_id: &str) -> Result<String, AuthError> {
        if let Some(value) = self.lookup(secret_id) {
            return Ok(value);
        }

        let value = self.inner.secret(secret_id).await?;
        self.lock().insert(
            secret_id.to_string(),
            CachedSecret {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }
}
