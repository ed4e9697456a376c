mod common;

use common::{init_tracing, json_response, MockTransport};
use courier_core::headers::{CONTENT_TYPE, JSON_CONTENT_TYPE};
use courier_core::{
    all, BasicAuth, CancelToken, Client, Error, FormData, HeaderConfig, Interceptor, Method,
    Payload, RequestConfig, Response, TransportError,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn request_tag(tag: &'static str, log: Log) -> Interceptor<RequestConfig> {
    Interceptor::map(move |config| {
        log.lock().unwrap().push(tag.to_string());
        Ok(config)
    })
}

fn response_tag(tag: &'static str, log: Log) -> Interceptor<Response> {
    Interceptor::map(move |response| {
        log.lock().unwrap().push(tag.to_string());
        Ok(response)
    })
}

fn logging_transport(log: Log) -> MockTransport {
    MockTransport::respond(move |_| {
        log.lock().unwrap().push("dispatch".to_string());
        Ok(json_response(200, "{}"))
    })
}

#[tokio::test]
async fn test_interceptor_execution_order() {
    init_tracing();
    let log = log();
    let client = Client::new(logging_transport(log.clone()));

    client.interceptors().request.register(request_tag("request A", log.clone()));
    client.interceptors().request.register(request_tag("request B", log.clone()));
    client.interceptors().response.register(response_tag("response A", log.clone()));
    client.interceptors().response.register(response_tag("response B", log.clone()));

    client.get("/order", None).await.unwrap();

    assert_eq!(
        entries(&log),
        vec!["request B", "request A", "dispatch", "response A", "response B"]
    );
}

#[tokio::test]
async fn test_ejected_interceptors_do_not_run() {
    let log = log();
    let client = Client::new(logging_transport(log.clone()));

    let a = client.interceptors().request.register(request_tag("a", log.clone()));
    client.interceptors().request.register(request_tag("b", log.clone()));
    let c = client.interceptors().response.register(response_tag("c", log.clone()));
    client.interceptors().request.eject(a);
    client.interceptors().response.eject(c);

    client.get("/eject", None).await.unwrap();
    assert_eq!(entries(&log), vec!["b", "dispatch"]);
}

#[tokio::test]
async fn test_request_interceptor_can_modify_config() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    client.interceptors().request.register(Interceptor::new(|config: RequestConfig| async move {
        Ok(config.with_header("X-Intercepted", "yes").with_param("page", 3))
    }));

    client.get("/users", None).await.unwrap();
    let seen = transport.last();
    assert_eq!(seen.headers.get("X-Intercepted"), Some("yes"));
    assert_eq!(seen.url, "/users?page=3");
}

#[tokio::test]
async fn test_response_interceptor_can_replace_data() {
    let client = Client::new(MockTransport::ok(r#"{"n": 1}"#));
    client.interceptors().response.register(Interceptor::map(|mut response: Response| {
        response.data = Some(Payload::from("stubbed data"));
        Ok(response)
    }));

    let response = client.get("/users", None).await.unwrap();
    assert_eq!(response.data, Some(Payload::from("stubbed data")));
}

#[tokio::test]
async fn test_failing_request_interceptor_skips_transport() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    client
        .interceptors()
        .request
        .register(Interceptor::map(|_| Err(Error::interceptor("missing token"))));

    let err = client.get("/secure", None).await.unwrap_err();
    assert_eq!(err.to_string(), "missing token");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_failure_handler_of_next_stage_recovers() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());

    // Registered first, so it runs after the failing interceptor.
    client.interceptors().request.register(
        Interceptor::map(Ok).on_rejected(|_err| async { Ok(RequestConfig::new("/recovered")) }),
    );
    client
        .interceptors()
        .request
        .register(Interceptor::map(|_| Err(Error::interceptor("boom"))));

    client.get("/original", None).await.unwrap();
    assert_eq!(transport.last().url, "/recovered");
}

#[tokio::test]
async fn test_response_failure_handler_recovers_status_error() {
    let client = Client::new(MockTransport::status(503, r#"{"retry": true}"#));
    client
        .interceptors()
        .response
        .register(Interceptor::rejection(|err: Error| async move {
            match err {
                Error::Status { response } if response.status == 503 => Ok(*response),
                other => Err(other),
            }
        }));

    let response = client.get("/flaky", None).await.unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(response.data, Some(Payload::from(r#"{"retry": true}"#)));
}

#[tokio::test]
async fn test_status_error_carries_response() {
    let client = Client::new(MockTransport::status(404, r#"{"error": "not found"}"#));
    let err = client.get("/missing", None).await.unwrap_err();

    assert_eq!(err.to_string(), "Request failed with status code 404");
    let response = err.response().unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.config.url.as_deref(), Some("/missing"));
    assert_eq!(response.data, Some(Payload::from(r#"{"error": "not found"}"#)));
    assert_eq!(response.json::<serde_json::Value>().unwrap()["error"], "not found");
}

#[tokio::test]
async fn test_custom_validate_status() {
    let client = Client::new(MockTransport::status(404, "{}"));
    let config = RequestConfig::default().with_validate_status(|status| status < 500);
    let response = client.get("/missing", Some(config)).await.unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_post_structured_body_is_json_encoded() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());

    client
        .post("/users", Some(Payload::Json(json!({"name": "ada"}))), None)
        .await
        .unwrap();

    let seen = transport.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.headers.get(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
    assert_eq!(seen.body, Some(Payload::from(r#"{"name":"ada"}"#)));
}

#[tokio::test]
async fn test_post_text_body_keeps_form_content_type() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());

    client.post("/login", Some(Payload::from("user=ada")), None).await.unwrap();
    assert_eq!(
        transport.last().headers.get(CONTENT_TYPE),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn test_multipart_body_has_no_content_type() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    let form = FormData::new()
        .text("title", "report")
        .file("file", "report.csv", Some("text/csv"), b"a,b\n1,2\n".to_vec());

    client.post("/upload", Some(form.into()), None).await.unwrap();

    let seen = transport.last();
    assert!(!seen.headers.contains_ignore_case(CONTENT_TYPE));
    assert!(matches!(seen.body, Some(Payload::Multipart(_))));
}

#[tokio::test]
async fn test_get_without_body_has_no_content_type() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    let config = RequestConfig::default().with_header("Content-Type", "application/json");

    client.get("/users", Some(config)).await.unwrap();
    assert!(!transport.last().headers.contains_ignore_case(CONTENT_TYPE));
}

#[tokio::test]
async fn test_base_url_params_and_method_headers() {
    let transport = MockTransport::ok("{}");
    let client = Client::create(
        transport.clone(),
        RequestConfig::default()
            .with_base_url("https://api.example.com/v1/")
            .with_headers(HeaderConfig::new().with_method(Method::Delete, "X-Confirm", "1")),
    );

    let config = RequestConfig::default().with_param("id", 12345).with_param("skip", None::<i32>);
    client.delete("/users", Some(config)).await.unwrap();

    let seen = transport.last();
    assert_eq!(seen.method, "DELETE");
    assert_eq!(seen.url, "https://api.example.com/v1/users?id=12345");
    assert_eq!(seen.headers.get("X-Confirm"), Some("1"));
    assert_eq!(seen.headers.get("Accept"), Some("application/json, text/plain, */*"));
}

#[tokio::test]
async fn test_absolute_url_ignores_base_url() {
    let transport = MockTransport::ok("{}");
    let client = Client::create(
        transport.clone(),
        RequestConfig::default().with_base_url("https://api.example.com"),
    );

    client.get("https://other.example.com/health", None).await.unwrap();
    assert_eq!(transport.last().url, "https://other.example.com/health");
}

#[tokio::test]
async fn test_defaults_mut_applies_to_later_requests() {
    let transport = MockTransport::ok("{}");
    let mut client = Client::new(transport.clone());
    client.defaults_mut().timeout_ms = Some(2500);
    client.defaults_mut().auth = Some(BasicAuth::new("janedoe", "s00pers3cret"));

    client.get("/me", None).await.unwrap();
    let seen = transport.last();
    assert_eq!(seen.timeout_ms, 2500);
    assert_eq!(
        seen.headers.get("Authorization"),
        Some("Basic amFuZWRvZTpzMDBwZXJzM2NyZXQ=")
    );
}

#[tokio::test]
async fn test_defaults_are_not_mutated_by_requests() {
    let client = Client::new(MockTransport::ok("{}"));
    client
        .get("/x", Some(RequestConfig::default().with_header("X-Once", "1")))
        .await
        .unwrap();

    let headers = client.defaults().headers.as_ref().unwrap();
    assert_eq!(headers.flat.get("X-Once"), None);
    assert!(client.defaults().url.is_none());
}

#[tokio::test]
async fn test_response_text_is_parsed_as_json() {
    let client = Client::new(MockTransport::ok(r#"{"id": 7, "tags": ["a"]}"#));
    let response = client.request_url("/item", None).await.unwrap();
    assert_eq!(response.data, Some(Payload::Json(json!({"id": 7, "tags": ["a"]}))));
    assert_eq!(response.headers.get("content-type"), Some("application/json"));
    assert_eq!(response.request.unwrap().url, "/item");
}

#[tokio::test]
async fn test_cancel_before_dispatch_skips_transport() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    let source = CancelToken::source();
    source.cancel.cancel(Some("Operation has been canceled."));

    let err = client
        .get("/users", Some(RequestConfig::default().with_cancel_token(source.token)))
        .await
        .unwrap_err();

    assert!(courier_core::is_cancel(&err));
    assert_eq!(err.to_string(), "Operation has been canceled.");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_cancel_during_transport() {
    let transport = MockTransport::hanging();
    let client = Client::new(transport.clone());
    let source = CancelToken::source();
    let config = RequestConfig::default().with_cancel_token(source.token.clone());

    let (outcome, _) = tokio::join!(client.get("/slow", Some(config)), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.cancel.cancel(Some("user navigated away"));
    });

    let err = outcome.unwrap_err();
    assert!(err.is_cancel());
    assert_eq!(err.to_string(), "user navigated away");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_one_token_cancels_many_requests() {
    let client = Client::new(MockTransport::hanging());
    let source = CancelToken::source();
    let config = || RequestConfig::default().with_cancel_token(source.token.clone());

    let (results, _) = tokio::join!(
        all(vec![client.get("/a", Some(config())), client.get("/b", Some(config()))]),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            source.cancel.cancel(None);
        }
    );

    assert_eq!(results.len(), 2);
    for result in results {
        let err = result.unwrap_err();
        assert!(err.is_cancel());
        assert_eq!(err.to_string(), "Request canceled");
    }
}

#[tokio::test]
async fn test_transport_timeout_maps_to_timeout_error() {
    let client = Client::new(MockTransport::respond(|request| {
        Err(TransportError::Timeout(request.timeout_ms))
    }));

    let err = client
        .get("/slow", Some(RequestConfig::default().with_timeout_ms(250)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.code(), Some("ECONNABORTED"));
    assert_eq!(err.to_string(), "Timeout of 250 ms exceeded");
    assert_eq!(err.config().unwrap().timeout_ms, Some(250));
}

#[tokio::test]
async fn test_missing_url_is_a_config_error() {
    let transport = MockTransport::ok("{}");
    let client = Client::new(transport.clone());
    let err = client.request(RequestConfig::default()).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_all_returns_results_in_order() {
    let client = Client::new(MockTransport::respond(|request| {
        Ok(json_response(200, &format!(r#"{{"url": "{}"}}"#, request.url)))
    }));

    let results = all(vec![client.get("/first", None), client.get("/second", None)]).await;
    let urls: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().json::<serde_json::Value>().unwrap()["url"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(urls, vec!["/first", "/second"]);
}
