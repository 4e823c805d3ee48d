//! Client session driven against a running proxy and mock provider

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockProvider, MockResponse, PROVISIONED_KEY};
use proofreader::session::{
    CompletionClient, ProofreadSettings, SessionStatus, StreamingSession, TextBuffer, VALIDATION_MESSAGE,
};

struct Harness {
    provider: MockProvider,
    client: CompletionClient,
}

async fn harness() -> Harness {
    let provider = MockProvider::start().await;
    let server = common::start_proxy(common::proxy_state(&provider)).await;
    let client = CompletionClient::new(&server).unwrap();
    Harness { provider, client }
}

fn settings(model: &str) -> ProofreadSettings {
    ProofreadSettings {
        model: Some(model.to_string()),
        context: "email".to_string(),
        api_key: PROVISIONED_KEY.to_string(),
        ..ProofreadSettings::default()
    }
}

/// Poll until the buffer holds `expected`
async fn wait_for_text(buffer: &TextBuffer, expected: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while buffer.contents() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("buffer never reached {:?}, has {:?}", expected, buffer.contents()));
}

#[tokio::test]
async fn test_session_streams_into_sink() {
    let h = harness().await;
    h.provider.push(MockResponse::sse(&["I saw", " him", " yesterday."]));

    let buffer = TextBuffer::new();
    let session = StreamingSession::new(h.client.clone(), Arc::new(buffer.clone()));

    session.start(&settings("gpt-4"), "i seen him yesterday").unwrap();
    let snapshot = session.finished().await;

    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_eq!(snapshot.text, "I saw him yesterday.");
    assert!(snapshot.error.is_none());
    assert_eq!(buffer.contents(), "I saw him yesterday.");
    assert_eq!(h.provider.received()[0].body["messages"][1]["content"], "i seen him yesterday");
}

#[tokio::test]
async fn test_session_validation_makes_no_request() {
    let h = harness().await;
    let session = StreamingSession::new(h.client.clone(), Arc::new(TextBuffer::new()));

    let err = session.start(&settings("gpt-4"), "   ").unwrap_err();
    assert_eq!(err.to_string(), VALIDATION_MESSAGE);
    assert_eq!(session.status(), SessionStatus::Errored);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.provider.received().is_empty());
}

#[tokio::test]
async fn test_session_reports_server_rejection() {
    let h = harness().await;
    let buffer = TextBuffer::new();
    let session = StreamingSession::new(h.client.clone(), Arc::new(buffer.clone()));

    session.start(&settings("not-a-real-model"), "some text").unwrap();
    let snapshot = session.finished().await;

    assert_eq!(snapshot.status, SessionStatus::Errored);
    assert!(snapshot.error.unwrap().starts_with("model not allowed"));
    assert_eq!(buffer.updates(), 0);
    assert!(h.provider.received().is_empty());
}

#[tokio::test]
async fn test_error_is_cleared_by_next_success() {
    let h = harness().await;
    let session = StreamingSession::new(h.client.clone(), Arc::new(TextBuffer::new()));

    session.start(&settings("not-a-real-model"), "some text").unwrap();
    assert!(session.finished().await.error.is_some());

    h.provider.push(MockResponse::sse(&["fixed"]));
    session.start(&settings("gpt-4"), "some text").unwrap();
    let snapshot = session.finished().await;
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.text, "fixed");
}

#[tokio::test]
async fn test_cancel_keeps_partial_text() {
    let h = harness().await;
    h.provider.push(MockResponse::sse_stalled(&["I saw", " him"]));

    let buffer = TextBuffer::new();
    let session = StreamingSession::new(h.client.clone(), Arc::new(buffer.clone()));

    session.start(&settings("gpt-4"), "i seen him yesterday").unwrap();
    wait_for_text(&buffer, "I saw him").await;
    assert_eq!(session.status(), SessionStatus::Streaming);

    session.cancel();
    let after_cancel = session.snapshot();
    let updates = buffer.updates();

    assert_eq!(after_cancel.status, SessionStatus::Idle);
    assert_eq!(after_cancel.text, "I saw him");
    assert!(after_cancel.error.is_none());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.snapshot(), after_cancel);
    assert_eq!(buffer.contents(), "I saw him");
    assert_eq!(buffer.updates(), updates);
}

#[tokio::test]
async fn test_rejected_start_cancels_request_in_flight() {
    let h = harness().await;
    h.provider.push(MockResponse::sse_stalled(&["first"]));

    let buffer = TextBuffer::new();
    let session = StreamingSession::new(h.client.clone(), Arc::new(buffer.clone()));

    session.start(&settings("gpt-4"), "one").unwrap();
    wait_for_text(&buffer, "first").await;

    let err = session.start(&settings("gpt-4"), "   ").unwrap_err();
    assert_eq!(err.to_string(), VALIDATION_MESSAGE);

    let rejected = session.finished().await;
    assert_eq!(rejected.status, SessionStatus::Errored);
    assert_eq!(rejected.error.as_deref(), Some(VALIDATION_MESSAGE));
    let updates = buffer.updates();

    // The first request must not write again or clear the error
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.snapshot(), rejected);
    assert_eq!(buffer.updates(), updates);

    session.cancel();
    assert_eq!(session.status(), SessionStatus::Errored);
}

#[tokio::test]
async fn test_new_start_supersedes_request_in_flight() {
    let h = harness().await;
    h.provider.push(MockResponse::sse_stalled(&["first"]));
    h.provider.push(MockResponse::sse(&["second"]));

    let buffer = TextBuffer::new();
    let session = StreamingSession::new(h.client.clone(), Arc::new(buffer.clone()));

    session.start(&settings("gpt-4"), "one").unwrap();
    wait_for_text(&buffer, "first").await;

    session.start(&settings("gpt-4"), "two").unwrap();
    let snapshot = session.finished().await;

    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_eq!(snapshot.text, "second");
    assert_eq!(buffer.contents(), "second");
    assert_eq!(h.provider.received().len(), 2);
}

#[tokio::test]
async fn test_client_lists_models() {
    let h = harness().await;
    let models = h.client.models().await.unwrap();
    assert_eq!(models, vec!["gpt-4", "gpt-4o-mini"]);
}
