//! URL building utilities: query serialization, base URL joining and origin checks

use crate::params::{ParamValue, Params};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Caller-supplied params serializer; its output is used verbatim.
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamsSerializer")
    }
}

/// Percent-encode like `encodeURIComponent`, then restore the characters that
/// are safe and readable inside a query string.
fn encode(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
        .replace("%40", "@")
        .replace("%3A", ":")
        .replace("%24", "$")
        .replace("%2C", ",")
        .replace("%20", "+")
        .replace("%5B", "[")
        .replace("%5D", "]")
}

fn serialize_params(params: &Params) -> String {
    let map = match params {
        Params::Query(query) => return query.to_string(),
        Params::Map(map) => map,
    };

    let mut parts = Vec::new();
    for (key, value) in map {
        let (key, values) = match value {
            ParamValue::Null => continue,
            ParamValue::Array(items) => (format!("{}[]", key), items.iter().collect::<Vec<_>>()),
            other => (key.clone(), vec![other]),
        };
        for value in values {
            parts.push(format!("{}={}", encode(&key), encode(&value.to_query_string())));
        }
    }
    parts.join("&")
}

/// Append `params` to `url`.
///
/// Any fragment is dropped and an existing query string is extended. When
/// nothing serializes, `url` is returned untouched.
pub fn build_url(url: &str, params: Option<&Params>, serializer: Option<&ParamsSerializer>) -> String {
    let Some(params) = params else {
        return url.to_string();
    };

    let serialized = match serializer {
        Some(serializer) => serializer.serialize(params),
        None => serialize_params(params),
    };
    if serialized.is_empty() {
        return url.to_string();
    }

    let base = match url.find('#') {
        Some(index) => &url[..index],
        None => url,
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, serialized)
}

/// True for `scheme://...` and protocol-relative `//...` URLs.
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Join `base` and `relative` with exactly one slash.
pub fn combine_url(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Scheme and host (with port) of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOrigin {
    pub scheme: String,
    pub host: String,
}

impl UrlOrigin {
    pub fn of(url: &Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        Self {
            scheme: url.scheme().to_string(),
            host,
        }
    }
}

/// Whether `request_url`, resolved against `origin`, shares its scheme and host.
pub fn is_url_same_origin(request_url: &str, origin: &Url) -> bool {
    match origin.join(request_url) {
        Ok(resolved) => UrlOrigin::of(&resolved) == UrlOrigin::of(origin),
        Err(e) => {
            tracing::trace!(url = request_url, error = %e, "could not resolve request URL");
            false
        }
    }
}
