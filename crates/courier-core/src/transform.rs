//! Ordered data transforms applied to request and response bodies

use crate::headers::{process_headers, Headers};
use crate::payload::Payload;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

pub type TransformFn = dyn Fn(Option<Payload>, &mut Headers) -> Option<Payload> + Send + Sync;

/// Ordered list of transform functions.
#[derive(Clone, Default)]
pub struct Transformers(Vec<Arc<TransformFn>>);

impl Transformers {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding one function.
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(Option<Payload>, &mut Headers) -> Option<Payload> + Send + Sync + 'static,
    {
        Self::new().then(f)
    }

    /// Append a function to run after the current ones.
    pub fn then<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Payload>, &mut Headers) -> Option<Payload> + Send + Sync + 'static,
    {
        self.0.push(Arc::new(f));
        self
    }

    /// Append every function of `other`.
    pub fn chain(mut self, other: &Transformers) -> Self {
        self.0.extend(other.0.iter().cloned());
        self
    }

    /// The library's request pipeline: header processing plus JSON encoding.
    pub fn default_request() -> Self {
        Self::single(default_transform_request)
    }

    /// The library's response pipeline: JSON decoding of text bodies.
    pub fn default_response() -> Self {
        Self::single(default_transform_response)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Transformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transformers({})", self.0.len())
    }
}

/// Run `data` through every function in order. Each function may also
/// rewrite `headers`.
pub fn transform(
    data: Option<Payload>,
    headers: &mut Headers,
    fns: Option<&Transformers>,
) -> Option<Payload> {
    let Some(fns) = fns else {
        return data;
    };
    fns.0.iter().fold(data, |data, f| f(data, &mut *headers))
}

/// Encode structured bodies as JSON text; everything else passes through.
pub fn default_transform_request(data: Option<Payload>, headers: &mut Headers) -> Option<Payload> {
    process_headers(headers, data.as_ref());
    match data {
        Some(Payload::Json(value)) => match serde_json::to_string(&value) {
            Ok(text) => Some(Payload::Text(text)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode request body as JSON");
                Some(Payload::Json(value))
            }
        },
        other => other,
    }
}

/// Decode text bodies that parse as JSON. Text that does not parse is
/// returned unchanged.
pub fn default_transform_response(data: Option<Payload>, _headers: &mut Headers) -> Option<Payload> {
    match data {
        Some(Payload::Text(text)) => match serde_json::from_str::<JsonValue>(&text) {
            Ok(value) => Some(Payload::Json(value)),
            Err(e) => {
                tracing::trace!(error = %e, "response body is not JSON, keeping text");
                Some(Payload::Text(text))
            }
        },
        other => other,
    }
}
