//! The client entry point and the request pipeline it drives

use crate::config::RequestConfig;
use crate::cookie::CookieReader;
use crate::defaults::defaults;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::interceptor::{Interceptor, Interceptors};
use crate::merge::merge_config;
use crate::method::Method;
use crate::payload::Payload;
use crate::response::Response;
use crate::settings::{ClientSettings, SettingsResult};
use crate::transport::Transport;
use crate::url_builder::build_url;
use futures::future::join_all;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// One step of the request pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    Request(Interceptor<RequestConfig>),
    Dispatch,
    Response(Interceptor<Response>),
}

/// Value threaded through the stages: a config before dispatch, a response after.
enum Flow {
    Config(Result<RequestConfig>),
    Response(Result<Response>),
}

/// HTTP client holding default configuration and interceptor registries.
pub struct Client {
    defaults: RequestConfig,
    interceptors: Interceptors,
    dispatcher: Dispatcher,
}

impl Client {
    /// Client with the library defaults.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::builder(transport).build()
    }

    /// Client whose defaults are the library defaults merged with `config`.
    pub fn create<T: Transport + 'static>(transport: T, config: RequestConfig) -> Self {
        Self::builder(transport).defaults(config).build()
    }

    pub fn builder<T: Transport + 'static>(transport: T) -> ClientBuilder {
        ClientBuilder::new(Arc::new(transport))
    }

    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut RequestConfig {
        &mut self.defaults
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Stages for the next request: request interceptors newest first, the
    /// dispatch step, then response interceptors oldest first.
    pub fn chain(&self) -> Vec<Stage> {
        let mut chain = vec![Stage::Dispatch];
        self.interceptors
            .request
            .for_each(|interceptor| chain.insert(0, Stage::Request(interceptor.clone())));
        self.interceptors
            .response
            .for_each(|interceptor| chain.push(Stage::Response(interceptor.clone())));
        chain
    }

    async fn run_stage(&self, stage: &Stage, flow: Flow) -> Flow {
        match (stage, flow) {
            (Stage::Request(interceptor), Flow::Config(outcome)) => {
                Flow::Config(interceptor.settle(outcome).await)
            }
            (Stage::Dispatch, Flow::Config(Ok(config))) => {
                Flow::Response(self.dispatcher.dispatch(config).await)
            }
            (Stage::Dispatch, Flow::Config(Err(err))) => Flow::Response(Err(err)),
            (Stage::Response(interceptor), Flow::Response(outcome)) => {
                Flow::Response(interceptor.settle(outcome).await)
            }
            // Request stages always precede dispatch and response stages follow
            // it, so any other pairing is left untouched.
            (_, flow) => flow,
        }
    }

    /// Send a request described by `config`.
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        let config = merge_config(&self.defaults, &config);
        let chain = self.chain();
        tracing::debug!(
            stages = chain.len(),
            method = %config.resolved_method(),
            url = config.url.as_deref().unwrap_or_default(),
            "running request pipeline"
        );

        let mut flow = Flow::Config(Ok(config));
        for stage in &chain {
            flow = self.run_stage(stage, flow).await;
        }
        match flow {
            Flow::Response(outcome) => outcome,
            Flow::Config(_) => Err(Error::Config(
                "request pipeline finished without dispatching".to_string(),
            )),
        }
    }

    /// Send a request to `url`, with optional extra config.
    pub async fn request_url(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.request(config.unwrap_or_default().with_url(url)).await
    }

    async fn without_body(&self, method: Method, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        let config = config.unwrap_or_default().with_method(method).with_url(url);
        self.request(config).await
    }

    async fn with_body(
        &self,
        method: Method,
        url: &str,
        data: Option<Payload>,
        config: Option<RequestConfig>,
    ) -> Result<Response> {
        let mut config = config.unwrap_or_default().with_method(method).with_url(url);
        if data.is_some() {
            config.data = data;
        }
        self.request(config).await
    }

    pub async fn get(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.without_body(Method::Get, url, config).await
    }

    pub async fn delete(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.without_body(Method::Delete, url, config).await
    }

    pub async fn head(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.without_body(Method::Head, url, config).await
    }

    pub async fn options(&self, url: &str, config: Option<RequestConfig>) -> Result<Response> {
        self.without_body(Method::Options, url, config).await
    }

    pub async fn post(&self, url: &str, data: Option<Payload>, config: Option<RequestConfig>) -> Result<Response> {
        self.with_body(Method::Post, url, data, config).await
    }

    pub async fn put(&self, url: &str, data: Option<Payload>, config: Option<RequestConfig>) -> Result<Response> {
        self.with_body(Method::Put, url, data, config).await
    }

    pub async fn patch(&self, url: &str, data: Option<Payload>, config: Option<RequestConfig>) -> Result<Response> {
        self.with_body(Method::Patch, url, data, config).await
    }

    /// The url and query string `config` resolves to, without a leading `?`.
    /// The base URL is not applied.
    pub fn get_uri(&self, config: &RequestConfig) -> String {
        let merged = merge_config(&self.defaults, config);
        let uri = build_url(
            merged.url.as_deref().unwrap_or_default(),
            merged.params.as_ref(),
            merged.params_serializer.as_ref(),
        );
        match uri.strip_prefix('?') {
            Some(rest) => rest.to_string(),
            None => uri,
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    defaults: RequestConfig,
    dispatcher: Dispatcher,
}

impl ClientBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            defaults: defaults(),
            dispatcher: Dispatcher::new(transport),
        }
    }

    /// Merge `config` over the current defaults.
    pub fn defaults(mut self, config: RequestConfig) -> Self {
        self.defaults = merge_config(&self.defaults, &config);
        self
    }

    /// Apply loaded settings: their config fields become defaults and their
    /// origin is used for same-origin checks.
    pub fn settings(mut self, settings: &ClientSettings) -> SettingsResult<Self> {
        if let Some(origin) = settings.origin_url()? {
            self = self.origin(origin);
        }
        Ok(self.defaults(settings.to_config()))
    }

    pub fn cookies<C: CookieReader + 'static>(mut self, cookies: C) -> Self {
        self.dispatcher = self.dispatcher.with_cookies(Arc::new(cookies));
        self
    }

    pub fn origin(mut self, origin: Url) -> Self {
        self.dispatcher = self.dispatcher.with_origin(origin);
        self
    }

    pub fn build(self) -> Client {
        Client {
            defaults: self.defaults,
            interceptors: Interceptors::default(),
            dispatcher: self.dispatcher,
        }
    }
}

/// Await every future and return all outcomes in input order.
pub async fn all<I>(requests: I) -> Vec<<I::Item as Future>::Output>
where
    I: IntoIterator,
    I::Item: Future,
{
    join_all(requests).await
}
