//! Client side of the translator service.
//!
//! The backend is an external collaborator: it translates queries, scores
//! risk and runs commands. This module only speaks its two JSON endpoints.

pub mod types;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{BackendConfig, Variant};
use crate::error::{ClientError, ClientResult};

pub use self::types::{
    Breakdown, ExecuteRequest, ExecutionResult, TranslateRequest, TranslationResult,
    API_KEY_REQUIRED,
};

const TRANSLATE_FALLBACK: &str = "Failed to translate command";
const EXECUTE_FALLBACK: &str = "Failed to execute command";

/// Remote translator operations
#[async_trait]
pub trait Backend: Send + Sync {
    /// Translate a natural-language query into a command
    async fn translate(&self, query: &str) -> ClientResult<TranslationResult>;

    /// Run `command` on the backend, optionally inside `working_dir`
    async fn execute(&self, command: &str, working_dir: Option<&str>)
        -> ClientResult<ExecutionResult>;
}

/// [`Backend`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    variant: Variant,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a backend client from configuration
    ///
    /// # Errors
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialise).
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                endpoint: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            variant: config.variant,
            timeout,
        })
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(path, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(path, e))?;

        if !status.is_success() {
            let message =
                types::error_message(&bytes).unwrap_or_else(|| fallback.to_string());
            warn!("{} returned {}: {}", path, status, message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn request_error(&self, path: &str, source: reqwest::Error) -> ClientError {
        let endpoint = format!("{}{}", self.base_url, path);
        if source.is_timeout() {
            warn!("Request to {} timed out", endpoint);
            ClientError::Timeout {
                endpoint,
                after: self.timeout,
            }
        } else {
            warn!("Request to {} failed: {}", endpoint, source);
            ClientError::Transport { endpoint, source }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn translate(&self, query: &str) -> ClientResult<TranslationResult> {
        let body = self
            .post_json(
                self.variant.translate_path(),
                &TranslateRequest { query },
                TRANSLATE_FALLBACK,
            )
            .await?;
        TranslationResult::from_value(&body)
    }

    async fn execute(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> ClientResult<ExecutionResult> {
        let body = self
            .post_json(
                self.variant.execute_path(),
                &ExecuteRequest {
                    command,
                    working_dir,
                },
                EXECUTE_FALLBACK,
            )
            .await?;
        ExecutionResult::from_value(&body, working_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = BackendConfig {
            base_url: "http://localhost:5000/".to_string(),
            variant: Variant::PowerShell,
            timeout_secs: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(backend.variant(), Variant::PowerShell);
    }

    #[test]
    fn test_execute_request_serializes_null_dir() {
        let body = serde_json::to_value(ExecuteRequest {
            command: "ls",
            working_dir: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "command": "ls", "working_dir": null }));
    }
}
