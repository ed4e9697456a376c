//! Query parameter values

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

/// A single query parameter value before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<ParamValue>),
    Object(Map<String, JsonValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// String form used on the wire. Arrays nested inside arrays are joined
    /// with commas; null inside an array renders as `null`.
    pub fn to_query_string(&self) -> String {
        match self {
            ParamValue::Null => "null".to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Number(n) => number_to_string(n),
            ParamValue::String(s) => s.clone(),
            ParamValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            ParamValue::Array(items) => items
                .iter()
                .map(ParamValue::to_query_string)
                .collect::<Vec<_>>()
                .join(","),
            ParamValue::Object(map) => {
                serde_json::to_string(map).unwrap_or_else(|_| "[object Object]".to_string())
            }
        }
    }
}

/// Integral floats render without a fraction (`1.0` becomes `1`), below the
/// point where exponent notation takes over.
fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

impl From<JsonValue> for ParamValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => ParamValue::Null,
            JsonValue::Bool(b) => ParamValue::Bool(b),
            JsonValue::Number(n) => ParamValue::Number(n),
            JsonValue::String(s) => ParamValue::String(s),
            JsonValue::Array(items) => {
                ParamValue::Array(items.into_iter().map(ParamValue::from).collect())
            }
            JsonValue::Object(map) => ParamValue::Object(map),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(ParamValue::Number)
            .unwrap_or_else(|| ParamValue::String(value.to_string()))
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        ParamValue::Date(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Pre-built query string; serialized verbatim when used as params.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `a=1&b=2` query string, with or without a leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn append(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        f.write_str(&serializer.finish())
    }
}

/// Query parameters attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Map(IndexMap<String, ParamValue>),
    Query(SearchParams),
}

impl Default for Params {
    fn default() -> Self {
        Params::Map(IndexMap::new())
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Turns a pre-built query string into a map first.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        if let Params::Query(query) = self {
            let map = query
                .pairs
                .iter()
                .map(|(k, v)| (k.clone(), ParamValue::String(v.clone())))
                .collect();
            *self = Params::Map(map);
        }
        if let Params::Map(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    /// Build params from a JSON object; other JSON values yield an empty map.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Params::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ParamValue::from(v)))
                    .collect(),
            ),
            _ => Params::default(),
        }
    }
}

impl From<SearchParams> for Params {
    fn from(query: SearchParams) -> Self {
        Params::Query(query)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
