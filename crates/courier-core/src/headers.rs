//! Header maps, header tiers and the processing applied before dispatch

use crate::method::Method;
use crate::payload::Payload;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

const COMMON_TIER: &str = "common";

/// Flat, insertion-ordered header map. Keys keep the casing they were set with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an entry with exactly the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.0.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    /// Remove every entry whose name matches case-insensitively.
    pub fn remove_ignore_case(&mut self, name: &str) {
        self.0.retain(|k, _| !k.eq_ignore_ascii_case(name));
    }

    /// Copy every entry of `other` over this map; `other` wins on equal names.
    pub fn extend_from(&mut self, other: &Headers) {
        for (k, v) in other.iter() {
            self.0.insert(k.to_string(), v.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Three-tier header configuration: headers for every request, headers for a
/// single verb, and headers set directly on the request.
///
/// Serialized as one map where `common` and verb names hold nested maps and
/// every other key is a plain header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawHeaderConfig", into = "RawHeaderConfig")]
pub struct HeaderConfig {
    pub common: Headers,
    pub methods: BTreeMap<Method, Headers>,
    pub flat: Headers,
}

impl HeaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config holding only request-level headers.
    pub fn from_flat(flat: Headers) -> Self {
        Self {
            flat,
            ..Self::default()
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.flat.insert(name, value);
        self
    }

    pub fn with_common(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.common.insert(name, value);
        self
    }

    pub fn with_method(
        mut self,
        method: Method,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.method_mut(method).insert(name, value);
        self
    }

    pub fn method(&self, method: Method) -> Option<&Headers> {
        self.methods.get(&method)
    }

    pub fn method_mut(&mut self, method: Method) -> &mut Headers {
        self.methods.entry(method).or_default()
    }

    /// Key-by-key merge of every tier; `over` wins on conflicts and tiers
    /// present on only one side are copied.
    pub fn merge(&self, over: &HeaderConfig) -> HeaderConfig {
        let mut merged = self.clone();
        merged.common.extend_from(&over.common);
        for (method, headers) in &over.methods {
            merged.method_mut(*method).extend_from(headers);
        }
        merged.flat.extend_from(&over.flat);
        merged
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawHeaderConfig(IndexMap<String, JsonValue>);

fn header_value(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

fn headers_from_object(map: Map<String, JsonValue>) -> Headers {
    map.into_iter().map(|(k, v)| (k, header_value(v))).collect()
}

fn headers_to_object(headers: Headers) -> JsonValue {
    JsonValue::Object(
        headers
            .0
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect(),
    )
}

impl From<RawHeaderConfig> for HeaderConfig {
    fn from(raw: RawHeaderConfig) -> Self {
        let mut config = HeaderConfig::default();
        for (key, value) in raw.0 {
            match value {
                JsonValue::Object(map) if key == COMMON_TIER => {
                    config.common.extend_from(&headers_from_object(map));
                }
                JsonValue::Object(map) => match key.parse::<Method>() {
                    Ok(method) => config
                        .method_mut(method)
                        .extend_from(&headers_from_object(map)),
                    Err(_) => config.flat.insert(key, JsonValue::Object(map).to_string()),
                },
                JsonValue::Null => {}
                other => config.flat.insert(key, header_value(other)),
            }
        }
        config
    }
}

impl From<HeaderConfig> for RawHeaderConfig {
    fn from(config: HeaderConfig) -> Self {
        let mut raw = IndexMap::new();
        if !config.common.is_empty() {
            raw.insert(COMMON_TIER.to_string(), headers_to_object(config.common));
        }
        for (method, headers) in config.methods {
            raw.insert(method.as_str().to_string(), headers_to_object(headers));
        }
        for (k, v) in config.flat.0 {
            raw.insert(k, JsonValue::String(v));
        }
        RawHeaderConfig(raw)
    }
}

/// Rewrite any case-insensitive match of `canonical` to the canonical casing.
pub fn normalize_header_name(headers: &mut Headers, canonical: &str) {
    let variants: Vec<String> = headers
        .0
        .keys()
        .filter(|k| k.as_str() != canonical && k.eq_ignore_ascii_case(canonical))
        .cloned()
        .collect();
    for name in variants {
        if let Some(value) = headers.0.shift_remove(&name) {
            headers.0.insert(canonical.to_string(), value);
        }
    }
}

/// Normalize `Content-Type` and default it to JSON for structured bodies.
pub fn process_headers(headers: &mut Headers, data: Option<&Payload>) {
    normalize_header_name(headers, CONTENT_TYPE);

    if matches!(data, Some(Payload::Json(_))) && headers.get(CONTENT_TYPE).is_none() {
        headers.insert(CONTENT_TYPE, JSON_CONTENT_TYPE);
    }
}

/// Collapse the tiers into the single map sent for `method`:
/// common, then the verb tier, then request-level headers.
pub fn flatten_headers(headers: &HeaderConfig, method: Method) -> Headers {
    let mut flat = headers.common.clone();
    if let Some(tier) = headers.method(method) {
        flat.extend_from(tier);
    }
    flat.extend_from(&headers.flat);
    flat
}

/// Parse raw `name: value` lines into a lower-cased map. Values keep any
/// colons after the first one.
pub fn parse_headers(raw: &str) -> Headers {
    let mut parsed = Headers::new();
    for line in raw.split("\r\n") {
        let (key, value) = match line.split_once(':') {
            Some((key, value)) => (key, value),
            None => (line, ""),
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        parsed.insert(key, value.trim());
    }
    parsed
}
