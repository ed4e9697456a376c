//! Library-wide default configuration

use crate::config::{RequestConfig, ResponseType, StatusValidator};
use crate::headers::{HeaderConfig, Headers, CONTENT_TYPE};
use crate::method::Method;
use crate::transform::Transformers;

pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";
pub const DEFAULT_FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const DEFAULT_XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";
pub const DEFAULT_XSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// Success range used when a config does not provide its own validator.
pub fn default_validate_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

fn default_headers() -> HeaderConfig {
    let mut headers = HeaderConfig::new().with_common("Accept", DEFAULT_ACCEPT);
    for method in Method::ALL {
        let tier = headers.method_mut(method);
        if method.takes_body() {
            *tier = Headers::new().with(CONTENT_TYPE, DEFAULT_FORM_CONTENT_TYPE);
        }
    }
    headers
}

/// The defaults every new client starts from.
pub fn defaults() -> RequestConfig {
    RequestConfig {
        method: Some(Method::Get),
        headers: Some(default_headers()),
        timeout_ms: Some(0),
        response_type: Some(ResponseType::Text),
        xsrf_cookie_name: Some(DEFAULT_XSRF_COOKIE_NAME.to_string()),
        xsrf_header_name: Some(DEFAULT_XSRF_HEADER_NAME.to_string()),
        transform_request: Some(Transformers::default_request()),
        transform_response: Some(Transformers::default_response()),
        validate_status: Some(StatusValidator::new(default_validate_status)),
        ..RequestConfig::default()
    }
}
