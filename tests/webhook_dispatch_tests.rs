//! Webhook delivery over real HTTP against wiremock receivers

use fastlease_workflow::config::WebhookConfig;
use fastlease_workflow::{
    NotificationDispatcher, RecordingObserver, StateMachine, WebhookEvent, WebhookPayload,
    WebhookWorkflow, WorkflowContext, WorkflowEvent, WorkflowState,
};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn webhook_config(endpoints: Vec<String>) -> WebhookConfig {
    WebhookConfig {
        endpoints,
        timeout_seconds: 5,
        max_retries: 3,
        retry_delay_ms: 10,
        headers: HashMap::new(),
    }
}

fn payload(event: WebhookEvent) -> WebhookPayload {
    let context: WorkflowContext = [("workflow_id", "wf_webhook_001")].into_iter().collect();
    WebhookPayload::new(event, "wf_webhook_001", WorkflowState::InProgress, &context)
}

async fn receiver(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_posts_json_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher =
        NotificationDispatcher::from_config(&webhook_config(vec![format!("{}/hooks", server.uri())]))
            .unwrap()
            .with_observer(RecordingObserver::new());

    assert!(dispatcher.send(&payload(WebhookEvent::Started)).await);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["event"], "workflow.started");
    assert_eq!(body["workflow_id"], "wf_webhook_001");
    assert_eq!(body["state"], "in_progress");
    assert_eq!(body["context"]["workflow_id"], "wf_webhook_001");
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-fastlease-signature", "abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = webhook_config(vec![server.uri()]);
    config
        .headers
        .insert("X-FastLease-Signature".to_string(), "abc123".to_string());
    let dispatcher = NotificationDispatcher::from_config(&config)
        .unwrap()
        .with_observer(RecordingObserver::new());

    assert!(dispatcher.send(&payload(WebhookEvent::Approved)).await);
}

#[tokio::test]
async fn test_failing_endpoint_does_not_block_the_next() {
    let broken = receiver(500).await;
    let healthy = receiver(200).await;
    let observer = RecordingObserver::new();

    let dispatcher = NotificationDispatcher::from_config(&webhook_config(vec![
        format!("{}/hooks", broken.uri()),
        format!("{}/hooks", healthy.uri()),
    ]))
    .unwrap()
    .with_observer(observer.clone());

    assert!(dispatcher.send(&payload(WebhookEvent::Completed)).await);

    // Non-200 answers use up every attempt
    assert_eq!(broken.received_requests().await.unwrap().len(), 3);
    assert_eq!(healthy.received_requests().await.unwrap().len(), 1);
    assert_eq!(
        observer.count(|e| matches!(e, WorkflowEvent::WebhookRejected { status: 500, .. })),
        3
    );
}

#[tokio::test]
async fn test_only_200_counts_as_delivered() {
    let accepted = receiver(202).await;
    let dispatcher =
        NotificationDispatcher::from_config(&webhook_config(vec![format!("{}/hooks", accepted.uri())]))
            .unwrap()
            .with_observer(RecordingObserver::new());

    assert!(!dispatcher.send(&payload(WebhookEvent::Started)).await);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_retried_then_given_up() {
    let observer = RecordingObserver::new();
    let dispatcher = NotificationDispatcher::from_config(&webhook_config(vec![
        "http://127.0.0.1:9/hooks".to_string(),
    ]))
    .unwrap()
    .with_retry_delay(Duration::from_millis(1))
    .with_observer(observer.clone());

    assert!(!dispatcher.send(&payload(WebhookEvent::Error)).await);
    assert_eq!(
        observer.count(|e| matches!(e, WorkflowEvent::WebhookTransportFailed { .. })),
        3
    );
}

#[tokio::test]
async fn test_webhook_workflow_lifecycle_over_http() {
    let server = receiver(200).await;
    let dispatcher =
        NotificationDispatcher::from_config(&webhook_config(vec![format!("{}/hooks", server.uri())]))
            .unwrap()
            .with_observer(RecordingObserver::new());
    let machine = StateMachine::builder()
        .observer(RecordingObserver::new())
        .build()
        .unwrap();
    let mut workflow = WebhookWorkflow::new("wf_webhook_001", machine, dispatcher);

    assert!(workflow.start_processing().await.is_transitioned());
    assert!(workflow.reject("insufficient credit history").await.is_transitioned());
    assert!(!workflow.approve().await.is_transitioned());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let last: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(last["event"], "workflow.rejected");
    assert_eq!(last["state"], "rejected");
    assert_eq!(last["context"]["rejection_reason"], "insufficient credit history");

    assert_eq!(workflow.event_history().len(), 2);
    assert_eq!(workflow.state(), WorkflowState::Rejected);
}

#[tokio::test]
async fn test_history_kept_when_nothing_is_listening() {
    let machine = StateMachine::builder()
        .observer(RecordingObserver::new())
        .build()
        .unwrap();
    let dispatcher = NotificationDispatcher::from_config(&webhook_config(Vec::new()))
        .unwrap()
        .with_observer(RecordingObserver::new());
    let mut workflow = WebhookWorkflow::new("wf_offline", machine, dispatcher);

    workflow.start_processing().await;
    workflow.approve().await;
    workflow.complete().await;

    let events: Vec<_> = workflow.event_history().iter().map(|p| p.event()).collect();
    assert_eq!(
        events,
        vec![WebhookEvent::Started, WebhookEvent::Approved, WebhookEvent::Completed]
    );
}
