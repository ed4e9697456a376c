pub mod cancel;
pub mod client;
pub mod config;
pub mod cookie;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod merge;
pub mod method;
pub mod params;
pub mod payload;
pub mod response;
pub mod settings;
pub mod transform;
pub mod transport;
pub mod url_builder;

// Re-export commonly used types
pub use cancel::{is_cancel, Cancel, CancelToken, CancelTokenSource, Canceler};
pub use client::{all, Client, ClientBuilder, Stage};
pub use config::{BasicAuth, Progress, ProgressHandler, RequestConfig, ResponseType, StatusValidator};
pub use cookie::{CookieJar, CookieReader};
pub use dispatch::Dispatcher;
pub use error::{BoxError, Error, Result};
pub use headers::{parse_headers, HeaderConfig, Headers};
pub use interceptor::{Interceptor, InterceptorId, InterceptorManager, Interceptors};
pub use merge::{merge_config, ConfigField, MergeStrategy};
pub use method::Method;
pub use params::{ParamValue, Params, SearchParams};
pub use payload::{FormData, FormPart, Payload};
pub use response::Response;
pub use settings::{ClientSettings, SettingsError, SettingsFormat, SettingsResult};
pub use transform::Transformers;
pub use transport::{RequestInfo, Transport, TransportError, TransportRequest, TransportResponse};
pub use url_builder::{build_url, ParamsSerializer};
