//! Request and response bodies as they travel through the pipeline

use serde_json::Value as JsonValue;

/// Body carried by a request or a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured value, encoded to JSON text by the default request transform
    Json(JsonValue),
    /// Pre-encoded text
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Multipart form; the transport chooses the content type and boundary
    Multipart(FormData),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Json(_))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Payload::Multipart(_))
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            Payload::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }
}

impl From<JsonValue> for Payload {
    fn from(value: JsonValue) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Payload::Multipart(form)
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        mime_type: Option<String>,
        content: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Multipart form body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: Option<&str>,
        content: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            filename: filename.into(),
            mime_type: mime_type.map(str::to_string),
            content,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
