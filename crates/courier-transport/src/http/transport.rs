//! `Transport` implementation backed by reqwest

use super::timeout::TimeoutPolicy;
use crate::error::{AdapterError, AdapterResult};
use async_trait::async_trait;
use courier_core::{
    FormData, FormPart, Headers, Payload, Progress, ProgressHandler, ResponseType, Transport,
    TransportError, TransportRequest, TransportResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};

/// Sends requests with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    policy: TimeoutPolicy,
}

impl ReqwestTransport {
    /// Transport with the default connect timeout.
    pub fn new() -> AdapterResult<Self> {
        Self::with_policy(TimeoutPolicy::default())
    }

    pub fn with_policy(policy: TimeoutPolicy) -> AdapterResult<Self> {
        policy.validate()?;
        let client = policy.apply_to_client_builder(Client::builder()).build()?;
        Ok(Self { client, policy })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            policy: TimeoutPolicy::default(),
        }
    }

    fn build_request(&self, request: &TransportRequest) -> AdapterResult<(RequestBuilder, Option<u64>)> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| AdapterError::InvalidMethod(request.method.clone()))?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let (builder, size) = match &request.body {
            None => (builder, None),
            Some(Payload::Text(text)) => (builder.body(text.clone()), Some(text.len() as u64)),
            Some(Payload::Binary(bytes)) => (builder.body(bytes.clone()), Some(bytes.len() as u64)),
            Some(Payload::Json(value)) => {
                let bytes = serde_json::to_vec(value)?;
                let size = bytes.len() as u64;
                (builder.body(bytes), Some(size))
            }
            Some(Payload::Multipart(form)) => {
                let size = multipart_size(form);
                (builder.multipart(multipart_form(form)?), Some(size))
            }
        };
        Ok((builder, size))
    }
}

fn multipart_size(form: &FormData) -> u64 {
    form.parts()
        .iter()
        .map(|part| match part {
            FormPart::Text { value, .. } => value.len() as u64,
            FormPart::File { content, .. } => content.len() as u64,
        })
        .sum()
}

fn multipart_form(form: &FormData) -> AdapterResult<Form> {
    let mut multipart = Form::new();
    for part in form.parts() {
        multipart = match part {
            FormPart::Text { name, value } => multipart.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                filename,
                mime_type,
                content,
            } => {
                let mut file = Part::bytes(content.clone()).file_name(filename.clone());
                if let Some(mime) = mime_type {
                    file = file.mime_str(mime)?;
                }
                multipart.part(name.clone(), file)
            }
        };
    }
    Ok(multipart)
}

fn response_headers(response: &reqwest::Response) -> Headers {
    let mut headers = Headers::new();
    for name in response.headers().keys() {
        let value = response
            .headers()
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        headers.insert(name.as_str().to_lowercase(), value);
    }
    headers
}

fn decode_body(bytes: Vec<u8>, response_type: ResponseType) -> Option<Payload> {
    match response_type {
        ResponseType::Bytes => Some(Payload::Binary(bytes)),
        ResponseType::Text => Some(Payload::Text(String::from_utf8_lossy(&bytes).into_owned())),
        ResponseType::Json if bytes.is_empty() => None,
        ResponseType::Json => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(Payload::Json(value)),
            Err(e) => {
                tracing::debug!(error = %e, "response body is not valid JSON, returning text");
                Some(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
            }
        },
    }
}

async fn read_body(
    mut response: reqwest::Response,
    progress: Option<&ProgressHandler>,
) -> Result<Vec<u8>, reqwest::Error> {
    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if let Some(progress) = progress {
            progress.report(Progress {
                loaded: body.len() as u64,
                total,
            });
        }
    }
    Ok(body)
}

impl ReqwestTransport {
    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let (builder, size) = self.build_request(&request)?;
        let policy = self.policy.for_request(request.timeout_ms);
        let download = request.on_download_progress.clone();

        let exchange = async {
            let response = builder.send().await?;
            if let (Some(progress), Some(size)) = (&request.on_upload_progress, size) {
                progress.report(Progress {
                    loaded: size,
                    total: Some(size),
                });
            }
            let status = response.status();
            let headers = response_headers(&response);
            let body = read_body(response, download.as_ref()).await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        };

        let (status, headers, body) = policy.execute_with_timeout(exchange).await?;
        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: decode_body(body, request.response_type),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending HTTP request");
        match request.cancel_token.clone() {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(TransportError::Aborted),
                    outcome = self.exchange(request) => outcome,
                }
            }
            None => self.exchange(request).await,
        }
    }
}
