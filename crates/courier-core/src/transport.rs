//! The boundary between the pipeline and the component doing network I/O

use crate::cancel::CancelToken;
use crate::config::{ProgressHandler, ResponseType};
use crate::error::BoxError;
use crate::headers::Headers;
use crate::payload::Payload;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Diagnostic handle describing the request a transport was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
}

/// A fully resolved request, ready for the wire.
#[derive(Clone)]
pub struct TransportRequest {
    /// Upper-case verb.
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Payload>,
    pub response_type: ResponseType,
    /// `0` means no timeout.
    pub timeout_ms: u64,
    pub with_credentials: bool,
    pub on_upload_progress: Option<ProgressHandler>,
    pub on_download_progress: Option<ProgressHandler>,
    pub cancel_token: Option<CancelToken>,
}

impl TransportRequest {
    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            method: self.method.clone(),
            url: self.url.clone(),
        }
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.len())
            .field("has_body", &self.body.is_some())
            .field("response_type", &self.response_type)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

/// What a transport hands back: raw status, lower-cased headers and a body
/// decoded according to the requested [`ResponseType`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub data: Option<Payload>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network failure: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("request aborted")]
    Aborted,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        TransportError::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Performs the network call for a resolved request.
///
/// Implementations should stop work and return [`TransportError::Aborted`]
/// once `cancel_token` fires. The dispatcher also races the call against the
/// token, so a transport that ignores it is still interrupted.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
