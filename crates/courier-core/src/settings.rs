//! Client settings loadable from JSON or YAML

use crate::config::{BasicAuth, RequestConfig, ResponseType};
use crate::headers::HeaderConfig;
use crate::method::Method;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Json,
}

impl SettingsFormat {
    /// Detect the format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(SettingsFormat::Yaml),
            Some("json") => Ok(SettingsFormat::Json),
            Some(ext) => Err(SettingsError::UnsupportedFormat(ext.to_string())),
            None => Err(SettingsError::UnsupportedFormat("no extension".to_string())),
        }
    }
}

/// The serializable part of a client's default configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub method: Option<Method>,
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,
    pub headers: Option<HeaderConfig>,
    pub response_type: Option<ResponseType>,
    pub with_credentials: Option<bool>,
    pub xsrf_cookie_name: Option<String>,
    pub xsrf_header_name: Option<String>,
    pub auth: Option<BasicAuth>,
    /// Origin used for same-origin checks, e.g. `https://app.example.com`.
    pub origin: Option<String>,
}

impl ClientSettings {
    pub fn from_json_str(content: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> SettingsResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn parse(content: &str, format: SettingsFormat) -> SettingsResult<Self> {
        match format {
            SettingsFormat::Yaml => Self::from_yaml_str(content),
            SettingsFormat::Json => Self::from_json_str(content),
        }
    }

    /// Load settings from a `.json`, `.yaml` or `.yml` file
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), ?format, "loading client settings");
        Self::parse(&content, format)
    }

    /// Config carrying only the fields these settings define.
    pub fn to_config(&self) -> RequestConfig {
        RequestConfig {
            base_url: self.base_url.clone(),
            method: self.method,
            timeout_ms: self.timeout_ms,
            headers: self.headers.clone(),
            response_type: self.response_type,
            with_credentials: self.with_credentials,
            xsrf_cookie_name: self.xsrf_cookie_name.clone(),
            xsrf_header_name: self.xsrf_header_name.clone(),
            auth: self.auth.clone(),
            ..RequestConfig::default()
        }
    }

    pub fn into_config(self) -> RequestConfig {
        self.to_config()
    }

    pub fn origin_url(&self) -> SettingsResult<Option<Url>> {
        self.origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|source| SettingsError::InvalidOrigin {
                    origin: origin.to_string(),
                    source,
                })
            })
            .transpose()
    }
}
