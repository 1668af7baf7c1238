//! Transport seam between the SDK and the identity service.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::net::HttpClient;

/// Sends one JSON request to the identity service and returns its JSON reply.
///
/// Implementations must not retry; the refresh coordinator relies on one
/// `post` being exactly one remote attempt.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// POST `body` to `path` (relative to the service base URL).
    async fn post(&self, path: &str, body: Value) -> Result<Value>;

    /// Name of this transport, for logs.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: AuthTransport + ?Sized> AuthTransport for std::sync::Arc<T> {
    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        (**self).post(path, body).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for `base_url`.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        Ok(Self { client, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl AuthTransport for HttpTransport {
    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = self.endpoint(path);
        debug!(url = url.as_str(), "POST");

        let response = self
            .client
            .inner()
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Network(e)
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Network(e)
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path, "Identity service returned an error");
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
