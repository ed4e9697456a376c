//! Merging of default and per-request configuration

use crate::config::RequestConfig;
use crate::headers::HeaderConfig;

/// How a single config field is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Override's value if defined, else base's.
    OverrideWins,
    /// Override's value if defined, else nothing. Never inherited from defaults.
    OverrideOnly,
    /// Maps merged key by key, override's leaves winning.
    DeepMerge,
}

/// Every field of [`RequestConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Url,
    Method,
    BaseUrl,
    Headers,
    Params,
    Data,
    Timeout,
    ResponseType,
    WithCredentials,
    XsrfCookieName,
    XsrfHeaderName,
    Auth,
    TransformRequest,
    TransformResponse,
    ParamsSerializer,
    ValidateStatus,
    CancelToken,
    OnUploadProgress,
    OnDownloadProgress,
}

impl ConfigField {
    pub const ALL: [ConfigField; 19] = [
        ConfigField::Url,
        ConfigField::Method,
        ConfigField::BaseUrl,
        ConfigField::Headers,
        ConfigField::Params,
        ConfigField::Data,
        ConfigField::Timeout,
        ConfigField::ResponseType,
        ConfigField::WithCredentials,
        ConfigField::XsrfCookieName,
        ConfigField::XsrfHeaderName,
        ConfigField::Auth,
        ConfigField::TransformRequest,
        ConfigField::TransformResponse,
        ConfigField::ParamsSerializer,
        ConfigField::ValidateStatus,
        ConfigField::CancelToken,
        ConfigField::OnUploadProgress,
        ConfigField::OnDownloadProgress,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ConfigField::Url => "url",
            ConfigField::Method => "method",
            ConfigField::BaseUrl => "base_url",
            ConfigField::Headers => "headers",
            ConfigField::Params => "params",
            ConfigField::Data => "data",
            ConfigField::Timeout => "timeout",
            ConfigField::ResponseType => "response_type",
            ConfigField::WithCredentials => "with_credentials",
            ConfigField::XsrfCookieName => "xsrf_cookie_name",
            ConfigField::XsrfHeaderName => "xsrf_header_name",
            ConfigField::Auth => "auth",
            ConfigField::TransformRequest => "transform_request",
            ConfigField::TransformResponse => "transform_response",
            ConfigField::ParamsSerializer => "params_serializer",
            ConfigField::ValidateStatus => "validate_status",
            ConfigField::CancelToken => "cancel_token",
            ConfigField::OnUploadProgress => "on_upload_progress",
            ConfigField::OnDownloadProgress => "on_download_progress",
        }
    }

    pub const fn strategy(self) -> MergeStrategy {
        match self {
            ConfigField::Url | ConfigField::Params | ConfigField::Data => {
                MergeStrategy::OverrideOnly
            }
            ConfigField::Headers => MergeStrategy::DeepMerge,
            ConfigField::Method
            | ConfigField::BaseUrl
            | ConfigField::Timeout
            | ConfigField::ResponseType
            | ConfigField::WithCredentials
            | ConfigField::XsrfCookieName
            | ConfigField::XsrfHeaderName
            | ConfigField::Auth
            | ConfigField::TransformRequest
            | ConfigField::TransformResponse
            | ConfigField::ParamsSerializer
            | ConfigField::ValidateStatus
            | ConfigField::CancelToken
            | ConfigField::OnUploadProgress
            | ConfigField::OnDownloadProgress => MergeStrategy::OverrideWins,
        }
    }
}

/// Values that can be merged structurally.
pub trait DeepMerge: Clone {
    fn deep_merge(&self, over: &Self) -> Self;
}

impl DeepMerge for HeaderConfig {
    fn deep_merge(&self, over: &Self) -> Self {
        self.merge(over)
    }
}

fn pick<T: Clone>(strategy: MergeStrategy, base: &Option<T>, over: &Option<T>) -> Option<T> {
    match strategy {
        MergeStrategy::OverrideOnly => over.clone(),
        MergeStrategy::OverrideWins | MergeStrategy::DeepMerge => {
            over.as_ref().or(base.as_ref()).cloned()
        }
    }
}

fn pick_deep<T: DeepMerge>(strategy: MergeStrategy, base: &Option<T>, over: &Option<T>) -> Option<T> {
    match (strategy, base, over) {
        (MergeStrategy::DeepMerge, Some(base), Some(over)) => Some(base.deep_merge(over)),
        _ => pick(strategy, base, over),
    }
}

fn merge_field(field: ConfigField, base: &RequestConfig, over: &RequestConfig, out: &mut RequestConfig) {
    let s = field.strategy();
    match field {
        ConfigField::Url => out.url = pick(s, &base.url, &over.url),
        ConfigField::Method => out.method = pick(s, &base.method, &over.method),
        ConfigField::BaseUrl => out.base_url = pick(s, &base.base_url, &over.base_url),
        ConfigField::Headers => out.headers = pick_deep(s, &base.headers, &over.headers),
        ConfigField::Params => out.params = pick(s, &base.params, &over.params),
        ConfigField::Data => out.data = pick(s, &base.data, &over.data),
        ConfigField::Timeout => out.timeout_ms = pick(s, &base.timeout_ms, &over.timeout_ms),
        ConfigField::ResponseType => {
            out.response_type = pick(s, &base.response_type, &over.response_type)
        }
        ConfigField::WithCredentials => {
            out.with_credentials = pick(s, &base.with_credentials, &over.with_credentials)
        }
        ConfigField::XsrfCookieName => {
            out.xsrf_cookie_name = pick(s, &base.xsrf_cookie_name, &over.xsrf_cookie_name)
        }
        ConfigField::XsrfHeaderName => {
            out.xsrf_header_name = pick(s, &base.xsrf_header_name, &over.xsrf_header_name)
        }
        ConfigField::Auth => out.auth = pick(s, &base.auth, &over.auth),
        ConfigField::TransformRequest => {
            out.transform_request = pick(s, &base.transform_request, &over.transform_request)
        }
        ConfigField::TransformResponse => {
            out.transform_response = pick(s, &base.transform_response, &over.transform_response)
        }
        ConfigField::ParamsSerializer => {
            out.params_serializer = pick(s, &base.params_serializer, &over.params_serializer)
        }
        ConfigField::ValidateStatus => {
            out.validate_status = pick(s, &base.validate_status, &over.validate_status)
        }
        ConfigField::CancelToken => {
            out.cancel_token = pick(s, &base.cancel_token, &over.cancel_token)
        }
        ConfigField::OnUploadProgress => {
            out.on_upload_progress = pick(s, &base.on_upload_progress, &over.on_upload_progress)
        }
        ConfigField::OnDownloadProgress => {
            out.on_download_progress =
                pick(s, &base.on_download_progress, &over.on_download_progress)
        }
    }
}

/// Combine `base` and `over` into a new config. Neither input is modified.
pub fn merge_config(base: &RequestConfig, over: &RequestConfig) -> RequestConfig {
    let mut merged = RequestConfig::default();
    for field in ConfigField::ALL {
        merge_field(field, base, over, &mut merged);
    }
    merged
}
