//! Request configuration

use crate::cancel::CancelToken;
use crate::headers::HeaderConfig;
use crate::method::Method;
use crate::params::{ParamValue, Params};
use crate::payload::Payload;
use crate::transform::Transformers;
use crate::url_builder::ParamsSerializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const REDACTED: &str = "***REDACTED***";

/// How the transport should decode the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Text,
    Json,
    #[serde(alias = "arraybuffer", alias = "blob")]
    Bytes,
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Bytes moved so far for an upload or a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Progress callback.
#[derive(Clone)]
pub struct ProgressHandler(Arc<dyn Fn(Progress) + Send + Sync>);

impl ProgressHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn report(&self, progress: Progress) {
        (self.0)(progress)
    }
}

impl fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHandler")
    }
}

/// Predicate deciding whether a status code counts as success.
#[derive(Clone)]
pub struct StatusValidator(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl StatusValidator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn validate(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StatusValidator")
    }
}

/// Configuration for one request, or the defaults of a client.
///
/// Every field is optional; `None` means "not defined here" and lets the
/// merge fall back to the other side (see [`crate::merge`]).
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub base_url: Option<String>,
    pub headers: Option<HeaderConfig>,
    pub params: Option<Params>,
    pub data: Option<Payload>,
    /// Milliseconds; `0` disables the timeout.
    pub timeout_ms: Option<u64>,
    pub response_type: Option<ResponseType>,
    pub with_credentials: Option<bool>,
    pub xsrf_cookie_name: Option<String>,
    pub xsrf_header_name: Option<String>,
    pub auth: Option<BasicAuth>,
    pub transform_request: Option<Transformers>,
    pub transform_response: Option<Transformers>,
    pub params_serializer: Option<ParamsSerializer>,
    pub validate_status: Option<StatusValidator>,
    pub cancel_token: Option<CancelToken>,
    pub on_upload_progress: Option<ProgressHandler>,
    pub on_download_progress: Option<ProgressHandler>,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn resolved_method(&self) -> Method {
        self.method.unwrap_or_default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderConfig) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set a request-level header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HeaderConfig::default)
            .flat
            .insert(name, value);
        self
    }

    pub fn with_params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.get_or_insert_with(Params::default).insert(key, value);
        self
    }

    pub fn with_data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    pub fn with_xsrf(mut self, cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(cookie_name.into());
        self.xsrf_header_name = Some(header_name.into());
        self
    }

    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_transform_request(mut self, transformers: Transformers) -> Self {
        self.transform_request = Some(transformers);
        self
    }

    pub fn with_transform_response(mut self, transformers: Transformers) -> Self {
        self.transform_response = Some(transformers);
        self
    }

    pub fn with_params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = Some(serializer);
        self
    }

    pub fn with_validate_status<F>(mut self, f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(StatusValidator::new(f));
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn with_upload_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_upload_progress = Some(ProgressHandler::new(f));
        self
    }

    pub fn with_download_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_download_progress = Some(ProgressHandler::new(f));
        self
    }
}
