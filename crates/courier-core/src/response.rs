use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::payload::Payload;
use crate::transport::RequestInfo;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A completed response together with the config that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    pub data: Option<Payload>,
    pub status: u16,
    pub status_text: String,
    /// Lower-cased header names.
    pub headers: Headers,
    pub config: RequestConfig,
    pub request: Option<RequestInfo>,
}

impl Response {
    /// Deserialize the body. Text bodies are parsed as JSON; a missing body
    /// is treated as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            Some(Payload::Json(value)) => Ok(T::deserialize(value)?),
            Some(Payload::Text(text)) => Ok(serde_json::from_str(text)?),
            Some(Payload::Binary(bytes)) => Ok(serde_json::from_slice(bytes)?),
            Some(Payload::Multipart(_)) => Err(Error::Decode(serde::de::Error::custom(
                "multipart bodies cannot be decoded as JSON",
            ))),
            None => Ok(T::deserialize(&JsonValue::Null)?),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_ignore_case(name)
    }
}
