use crate::fetch::types::{FetchError, Headers};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Something that answers a GET with a decoded JSON body.
///
/// Authentication, TLS and transport are the implementor's concern; the fetcher
/// only passes headers through.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str, headers: &Headers) -> Result<Value, FetchError>;
}

/// `JsonSource` over a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpJsonSource {
    client: Client,
}

impl HttpJsonSource {
    /// Build a client whose requests each time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonSource for HttpJsonSource {
    async fn get_json(&self, url: &str, headers: &Headers) -> Result<Value, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if err.is_decode() {
        FetchError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
