use courier_core::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// Failures while assembling a request surface as network errors on the pipeline side
impl From<AdapterError> for TransportError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        TransportError::network_with_source(message, err)
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;
