//! OpenAI-compatible provider against a wiremock server
//!
//! Every failure mode the executor can see (service error, malformed body,
//! timeout, refused connection) is checked for its error kind.

use std::time::Duration;

use batch_infer::error::BatchError;
use batch_infer::provider::{InferRequest, OpenAIProvider, Provider};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn provider(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::new(
        &format!("{}/v1", server.uri()),
        Some("sk-test".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn request() -> InferRequest {
    InferRequest::new("Solve: 1+1", "qwen")
        .with_temperature(0.0)
        .with_max_tokens(16)
}

fn completion(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
    })
}

// =============================================================================
// SUCCESS
// =============================================================================

#[tokio::test]
async fn test_infer_sends_chat_completion_payload() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "qwen",
            "messages": [{"role": "user", "content": "Solve: 1+1"}],
            "max_tokens": 16,
            "temperature": 0.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("2"))))
        .expect(1)
        .mount(&server)
        .await;

    // Act
    let response = provider(&server).infer(&request()).await;

    // Assert
    assert_eq!(response.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn test_infer_without_key_sends_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer not-needed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("ok"))))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAIProvider::new(&server.uri(), None, Duration::from_secs(5)).unwrap();
    assert_eq!(provider.infer(&request()).await.unwrap().as_deref(), Some("ok"));
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_service_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let err = provider(&server).infer(&request()).await.unwrap_err();

    match &err {
        BatchError::Service { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "model overloaded");
        }
        other => panic!("expected Service error, got {other:?}"),
    }
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = provider(&server).infer(&request()).await.unwrap_err();
    assert!(matches!(err, BatchError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn test_empty_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider(&server).infer(&request()).await.unwrap_err();
    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_null_content_is_an_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(null))))
        .mount(&server)
        .await;

    let response = provider(&server).infer(&request()).await.unwrap();
    assert!(response.is_none());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!("late")))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(
        &format!("{}/v1", server.uri()),
        None,
        Duration::from_millis(200),
    )
    .unwrap();

    let err = provider.infer(&request()).await.unwrap_err();
    assert!(matches!(err, BatchError::Timeout { .. }), "{err:?}");
    assert!(err.to_string().contains("after 200ms"), "{err}");
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    // Bind then drop a listener to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let provider = OpenAIProvider::new(
        &format!("http://127.0.0.1:{port}/v1"),
        None,
        Duration::from_secs(5),
    )
    .unwrap();

    let err = provider.infer(&request()).await.unwrap_err();
    assert!(matches!(err, BatchError::Connection { .. }), "{err:?}");
    assert!(!err.is_fatal());
}
