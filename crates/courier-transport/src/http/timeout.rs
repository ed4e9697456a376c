//! Timeout handling for HTTP requests

use crate::error::{AdapterError, AdapterResult};
use courier_core::TransportError;
use reqwest::ClientBuilder;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Connect timeout for the shared client plus a per-request total timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub connect_ms: u64,
    /// Whole-exchange limit; `0` disables it.
    pub request_ms: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            connect_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_ms: 0,
        }
    }
}

impl TimeoutPolicy {
    pub fn new(connect_ms: u64) -> Self {
        Self {
            connect_ms,
            request_ms: 0,
        }
    }

    /// The same policy with a request limit.
    pub fn for_request(self, request_ms: u64) -> Self {
        Self { request_ms, ..self }
    }

    /// Apply connection-level timeouts to a reqwest ClientBuilder.
    /// The client is shared across requests, so no total timeout is set here.
    pub fn apply_to_client_builder(&self, builder: ClientBuilder) -> ClientBuilder {
        if self.connect_ms > 0 {
            builder.connect_timeout(Duration::from_millis(self.connect_ms))
        } else {
            builder
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_ms > 0).then(|| Duration::from_millis(self.request_ms))
    }

    pub fn validate(&self) -> AdapterResult<()> {
        if self.request_ms > 0 && self.connect_ms > self.request_ms {
            tracing::warn!(
                connect_ms = self.connect_ms,
                request_ms = self.request_ms,
                "connect timeout exceeds request timeout"
            );
        }
        if self.connect_ms == 0 {
            return Err(AdapterError::InvalidConfig(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Classify a reqwest failure. Connect failures, connect timeouts
    /// included, are network errors; only an elapsed request limit is a timeout.
    pub fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_connect() {
            TransportError::network_with_source(format!("Connection failed: {}", err), err)
        } else if err.is_timeout() && self.request_ms > 0 {
            TransportError::Timeout(self.request_ms)
        } else {
            TransportError::network_with_source(err.to_string(), err)
        }
    }

    /// Run an exchange under the request limit.
    pub async fn execute_with_timeout<F, T>(&self, operation: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        let outcome = match self.request_timeout() {
            Some(limit) => match timeout(limit, operation).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(timeout_ms = self.request_ms, "request timed out");
                    return Err(TransportError::Timeout(self.request_ms));
                }
            },
            None => operation.await,
        };
        outcome.map_err(|err| self.classify(err))
    }
}
