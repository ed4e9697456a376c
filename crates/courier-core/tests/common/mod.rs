#![allow(dead_code)]

use async_trait::async_trait;
use courier_core::{Headers, Payload, Transport, TransportError, TransportRequest, TransportResponse};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

type Responder =
    Arc<dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// Transport that records every request and answers from a closure.
#[derive(Clone)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    responder: Responder,
    delay: Option<Duration>,
    hang: bool,
}

pub fn json_response(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        status_text: String::new(),
        headers: Headers::new().with("content-type", "application/json"),
        data: Some(Payload::from(body)),
    }
}

impl MockTransport {
    pub fn respond<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
            delay: None,
            hang: false,
        }
    }

    /// Always answers `200` with `body` as text.
    pub fn ok(body: &'static str) -> Self {
        Self::respond(move |_| Ok(json_response(200, body)))
    }

    pub fn status(status: u16, body: &'static str) -> Self {
        Self::respond(move |_| Ok(json_response(status, body)))
    }

    /// Never answers.
    pub fn hanging() -> Self {
        let mut transport = Self::ok("{}");
        transport.hang = true;
        transport
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> TransportRequest {
        self.requests().pop().expect("no request reached the transport")
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(&request)
    }
}
