//! Cookie lookup used for XSRF protection

use indexmap::IndexMap;

/// Source of cookie values.
pub trait CookieReader: Send + Sync {
    fn read(&self, name: &str) -> Option<String>;
}

impl<F> CookieReader for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn read(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Cookies parsed from a `name=value; other=value` header string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: IndexMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cookie string. Values are percent-decoded; malformed pairs are
    /// skipped. The first occurrence of a name wins.
    pub fn parse(raw: &str) -> Self {
        let mut cookies = IndexMap::new();
        for pair in raw.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            cookies.entry(name.to_string()).or_insert(value);
        }
        Self { cookies }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.cookies.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl CookieReader for CookieJar {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}
