//! reqwest-backed transport

pub mod timeout;
pub mod transport;

pub use timeout::{TimeoutPolicy, DEFAULT_CONNECT_TIMEOUT_MS};
pub use transport::ReqwestTransport;
