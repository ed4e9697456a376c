use crate::cancel::Cancel;
use crate::config::RequestConfig;
use crate::response::Response;
use crate::transport::RequestInfo;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error code attached to timeouts, kept for callers that branch on it.
pub const TIMEOUT_CODE: &str = "ECONNABORTED";

/// Failures surfaced by the request pipeline.
///
/// Transport-level failures carry the config that produced them so that a
/// response interceptor can inspect or replay the request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network Error")]
    Network {
        config: Box<RequestConfig>,
        request: Option<RequestInfo>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Timeout of {timeout_ms} ms exceeded")]
    Timeout {
        config: Box<RequestConfig>,
        request: Option<RequestInfo>,
        timeout_ms: u64,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancel),

    #[error("Request failed with status code {}", .response.status)]
    Status { response: Box<Response> },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Interceptor {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    /// Failure raised from user interceptor code.
    pub fn interceptor(message: impl Into<String>) -> Self {
        Error::Interceptor {
            message: message.into(),
            source: None,
        }
    }

    pub fn interceptor_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Interceptor {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::Timeout { .. } => Some(TIMEOUT_CODE),
            _ => None,
        }
    }

    /// The config that produced this error, when one is known.
    pub fn config(&self) -> Option<&RequestConfig> {
        match self {
            Error::Network { config, .. } | Error::Timeout { config, .. } => Some(config),
            Error::Status { response } => Some(&response.config),
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&RequestInfo> {
        match self {
            Error::Network { request, .. } | Error::Timeout { request, .. } => request.as_ref(),
            Error::Status { response } => response.request.as_ref(),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Status { response } => Some(response),
            _ => None,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
