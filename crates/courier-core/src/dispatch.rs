//! The dispatch stage: resolve a merged config and hand it to the transport

use crate::cancel::Cancel;
use crate::config::{BasicAuth, RequestConfig};
use crate::cookie::CookieReader;
use crate::defaults::default_validate_status;
use crate::error::{Error, Result};
use crate::headers::{flatten_headers, Headers, AUTHORIZATION, CONTENT_TYPE};
use crate::payload::Payload;
use crate::response::Response;
use crate::transform::transform;
use crate::transport::{RequestInfo, Transport, TransportError, TransportRequest, TransportResponse};
use crate::url_builder::{build_url, combine_url, is_absolute_url, is_url_same_origin};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Join `base_url` and `url` when `url` is relative and a base is set.
pub fn build_full_path(base_url: Option<&str>, url: &str) -> String {
    match base_url {
        Some(base) if !is_absolute_url(url) => combine_url(base, url),
        _ => url.to_string(),
    }
}

fn basic_auth_header(auth: &BasicAuth) -> String {
    let credentials = format!("{}:{}", auth.username, auth.password);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

/// Sends resolved requests through a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    cookies: Option<Arc<dyn CookieReader>>,
    origin: Option<Url>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cookies: None,
            origin: None,
        }
    }

    /// Cookie source consulted for the XSRF header.
    pub fn with_cookies(mut self, cookies: Arc<dyn CookieReader>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Origin that same-origin checks compare against.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<&Url> {
        self.origin.as_ref()
    }

    fn xsrf_value(&self, config: &RequestConfig, url: &str) -> Option<String> {
        let cookies = self.cookies.as_ref()?;
        let cookie_name = config.xsrf_cookie_name.as_deref()?;
        let same_origin = self
            .origin
            .as_ref()
            .is_some_and(|origin| is_url_same_origin(url, origin));
        if config.with_credentials.unwrap_or(false) || same_origin {
            cookies.read(cookie_name)
        } else {
            None
        }
    }

    /// Turn a merged config into the request handed to the transport.
    pub fn prepare(&self, config: &RequestConfig) -> Result<TransportRequest> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("request has no url".to_string()))?;
        let method = config.resolved_method();
        let full_path = build_full_path(config.base_url.as_deref(), url);
        let url = build_url(
            &full_path,
            config.params.as_ref(),
            config.params_serializer.as_ref(),
        );

        let mut header_config = config.headers.clone().unwrap_or_default();
        let body = transform(
            config.data.clone(),
            &mut header_config.flat,
            config.transform_request.as_ref(),
        );
        let mut headers = flatten_headers(&header_config, method);

        if matches!(body, Some(Payload::Multipart(_))) {
            // The transport writes its own multipart boundary.
            headers.remove_ignore_case(CONTENT_TYPE);
        }
        if let Some(auth) = &config.auth {
            headers.insert(AUTHORIZATION, basic_auth_header(auth));
        }
        if let Some(value) = self.xsrf_value(config, &url) {
            if let Some(header_name) = config.xsrf_header_name.as_deref() {
                headers.insert(header_name, value);
            }
        }
        if body.is_none() {
            headers.remove_ignore_case(CONTENT_TYPE);
        }

        Ok(TransportRequest {
            method: method.as_upper().to_string(),
            url,
            headers,
            body,
            response_type: config.response_type.unwrap_or_default(),
            timeout_ms: config.timeout_ms.unwrap_or(0),
            with_credentials: config.with_credentials.unwrap_or(false),
            on_upload_progress: config.on_upload_progress.clone(),
            on_download_progress: config.on_download_progress.clone(),
            cancel_token: config.cancel_token.clone(),
        })
    }

    async fn send(
        &self,
        config: &RequestConfig,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        match &config.cancel_token {
            Some(token) => {
                let token = token.clone();
                tokio::select! {
                    biased;
                    reason = token.cancelled() => {
                        tracing::debug!(reason = %reason, "request cancelled in flight");
                        Err(TransportError::Aborted)
                    }
                    outcome = self.transport.send(request) => outcome,
                }
            }
            None => self.transport.send(request).await,
        }
    }

    fn map_transport_error(
        config: &RequestConfig,
        request: RequestInfo,
        err: TransportError,
    ) -> Error {
        match err {
            TransportError::Timeout(timeout_ms) => Error::Timeout {
                config: Box::new(config.clone()),
                request: Some(request),
                timeout_ms,
            },
            TransportError::Aborted => Error::Cancelled(
                config
                    .cancel_token
                    .as_ref()
                    .and_then(|token| token.reason())
                    .unwrap_or_default(),
            ),
            err @ TransportError::Network { .. } => Error::Network {
                config: Box::new(config.clone()),
                request: Some(request),
                source: Some(err.into()),
            },
        }
    }

    fn throw_if_cancelled(config: &RequestConfig) -> std::result::Result<(), Cancel> {
        match &config.cancel_token {
            Some(token) => token.throw_if_requested(),
            None => Ok(()),
        }
    }

    /// Run the dispatch stage for a merged config.
    pub async fn dispatch(&self, config: RequestConfig) -> Result<Response> {
        Self::throw_if_cancelled(&config)?;

        let request = self.prepare(&config)?;
        let info = request.info();
        tracing::debug!(method = %info.method, url = %info.url, "dispatching request");

        let raw = match self.send(&config, request).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(method = %info.method, url = %info.url, error = %err, "transport failed");
                return Err(Self::map_transport_error(&config, info, err));
            }
        };

        let valid = match &config.validate_status {
            Some(validator) => validator.validate(raw.status),
            None => default_validate_status(raw.status),
        };
        tracing::debug!(status = raw.status, valid, url = %info.url, "response received");

        // Rejected responses keep the body exactly as the transport decoded it
        if !valid {
            return Err(Error::Status {
                response: Box::new(Response {
                    data: raw.data,
                    status: raw.status,
                    status_text: raw.status_text,
                    headers: raw.headers,
                    config,
                    request: Some(info),
                }),
            });
        }

        let mut headers: Headers = raw.headers;
        let data = transform(raw.data, &mut headers, config.transform_response.as_ref());
        Ok(Response {
            data,
            status: raw.status,
            status_text: raw.status_text,
            headers,
            config,
            request: Some(info),
        })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("cookies", &self.cookies.is_some())
            .field("origin", &self.origin.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::defaults::defaults;
    use crate::headers::{HeaderConfig, JSON_CONTENT_TYPE};
    use crate::merge::merge_config;
    use crate::method::Method;
    use crate::payload::FormData;
    use async_trait::async_trait;
    use crate::transform::Transformers;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NeverCalled;

    #[async_trait]
    impl Transport for NeverCalled {
        async fn send(&self, _: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
            Err(TransportError::network("transport should not be reached"))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(NeverCalled))
    }

    fn resolved(config: RequestConfig) -> RequestConfig {
        merge_config(&defaults(), &config)
    }

    #[test]
    fn test_full_path() {
        assert_eq!(build_full_path(Some("https://api.example.com/"), "/users"), "https://api.example.com/users");
        assert_eq!(build_full_path(Some("https://api.example.com"), "https://other.example.com/x"), "https://other.example.com/x");
        assert_eq!(build_full_path(None, "/users"), "/users");
    }

    #[test]
    fn test_prepare_requires_url() {
        let err = dispatcher().prepare(&resolved(RequestConfig::default())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_prepare_structured_post() {
        let config = resolved(
            RequestConfig::new("/users")
                .with_method(Method::Post)
                .with_data(json!({"name": "ada"})),
        );
        let request = dispatcher().prepare(&config).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.headers.get(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
        assert_eq!(request.body, Some(Payload::from(r#"{"name":"ada"}"#)));
        assert_eq!(request.headers.get("Accept"), Some(crate::defaults::DEFAULT_ACCEPT));
    }

    #[test]
    fn test_prepare_multipart_drops_content_type() {
        let config = resolved(
            RequestConfig::new("/upload")
                .with_method(Method::Post)
                .with_header("content-type", "multipart/form-data")
                .with_data(FormData::new().text("a", "1")),
        );
        let request = dispatcher().prepare(&config).unwrap();
        assert!(!request.headers.contains_ignore_case(CONTENT_TYPE));
    }

    #[test]
    fn test_prepare_without_body_drops_content_type() {
        let config = resolved(RequestConfig::new("/users").with_method(Method::Post));
        let request = dispatcher().prepare(&config).unwrap();
        assert!(request.body.is_none());
        assert!(!request.headers.contains_ignore_case(CONTENT_TYPE));
    }

    #[test]
    fn test_prepare_basic_auth() {
        let config = resolved(RequestConfig::new("/me").with_auth(BasicAuth::new("janedoe", "s00pers3cret")));
        let request = dispatcher().prepare(&config).unwrap();
        assert_eq!(
            request.headers.get(AUTHORIZATION),
            Some("Basic amFuZWRvZTpzMDBwZXJzM2NyZXQ=")
        );
    }

    #[test]
    fn test_xsrf_header_only_for_same_origin_or_credentials() {
        let jar = crate::cookie::CookieJar::parse("XSRF-TOKEN=12345");
        let origin = Url::parse("https://app.example.com").unwrap();
        let dispatcher = dispatcher()
            .with_cookies(Arc::new(jar))
            .with_origin(origin);

        let same = dispatcher.prepare(&resolved(RequestConfig::new("/api"))).unwrap();
        assert_eq!(same.headers.get("X-XSRF-TOKEN"), Some("12345"));

        let cross = dispatcher
            .prepare(&resolved(RequestConfig::new("https://other.example.com/api")))
            .unwrap();
        assert_eq!(cross.headers.get("X-XSRF-TOKEN"), None);

        let with_credentials = dispatcher
            .prepare(&resolved(
                RequestConfig::new("https://other.example.com/api").with_credentials(true),
            ))
            .unwrap();
        assert_eq!(with_credentials.headers.get("X-XSRF-TOKEN"), Some("12345"));
    }

    #[test]
    fn test_prepare_keeps_method_tier_only_for_its_verb() {
        let headers = HeaderConfig::new().with_method(Method::Delete, "X-Delete", "1");
        let config = resolved(RequestConfig::new("/x").with_headers(headers));
        let request = dispatcher().prepare(&config).unwrap();
        assert_eq!(request.headers.get("X-Delete"), None);
    }

    struct Answer(u16, &'static str);

    #[async_trait]
    impl Transport for Answer {
        async fn send(&self, _: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
            Ok(TransportResponse {
                status: self.0,
                status_text: String::new(),
                headers: Headers::new(),
                data: Some(Payload::from(self.1)),
            })
        }
    }

    fn counting_transform(runs: &Arc<AtomicUsize>) -> Transformers {
        let runs = runs.clone();
        Transformers::single(move |data, _| {
            runs.fetch_add(1, Ordering::SeqCst);
            data
        })
    }

    #[tokio::test]
    async fn test_rejected_status_skips_response_transform() {
        let runs = Arc::new(AtomicUsize::new(0));
        let config = resolved(
            RequestConfig::new("/missing").with_transform_response(counting_transform(&runs)),
        );

        let err = Dispatcher::new(Arc::new(Answer(404, r#"{"error":"nf"}"#)))
            .dispatch(config)
            .await
            .unwrap_err();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        let response = err.response().unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.data, Some(Payload::from(r#"{"error":"nf"}"#)));
    }

    #[tokio::test]
    async fn test_accepted_status_runs_response_transform() {
        let runs = Arc::new(AtomicUsize::new(0));
        let config = resolved(
            RequestConfig::new("/users").with_transform_response(counting_transform(&runs)),
        );

        let response = Dispatcher::new(Arc::new(Answer(200, "ok")))
            .dispatch(config)
            .await
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(response.data, Some(Payload::from("ok")));
    }

    #[tokio::test]
    async fn test_cancel_after_completion_keeps_response() {
        let source = CancelToken::source();
        let cancel = source.cancel.clone();
        let config = resolved(
            RequestConfig::new("/users")
                .with_cancel_token(source.token)
                .with_transform_response(Transformers::single(move |data, _| {
                    cancel.cancel(Some("too late"));
                    data
                })),
        );

        let response = Dispatcher::new(Arc::new(Answer(200, "ok")))
            .dispatch(config)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_transport() {
        let source = CancelToken::source();
        source.cancel.cancel(Some("Operation has been canceled."));
        let config = resolved(RequestConfig::new("/users").with_cancel_token(source.token));

        let err = dispatcher().dispatch(config).await.unwrap_err();
        assert!(err.is_cancel());
        assert_eq!(err.to_string(), "Operation has been canceled.");
    }
}
