pub mod error;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types
pub use error::{AdapterError, AdapterResult};

#[cfg(feature = "http")]
pub use http::{ReqwestTransport, TimeoutPolicy};

/// Client with the library defaults sending through [`ReqwestTransport`].
#[cfg(feature = "http")]
pub fn client() -> AdapterResult<courier_core::Client> {
    Ok(courier_core::Client::new(ReqwestTransport::new()?))
}

/// Client whose defaults are the library defaults merged with `config`.
#[cfg(feature = "http")]
pub fn create(config: courier_core::RequestConfig) -> AdapterResult<courier_core::Client> {
    Ok(courier_core::Client::create(ReqwestTransport::new()?, config))
}
