//! Remote task client tests against a mocked status endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};

use voicegate::core::video::{RemoteTaskClient, RemoteTaskConfig, RemoteTaskError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Replays a scripted series of status bodies, repeating the last one.
struct ScriptedStatus {
    hits: AtomicUsize,
    script: Vec<serde_json::Value>,
}

impl ScriptedStatus {
    fn new(script: Vec<serde_json::Value>) -> Self {
        Self {
            hits: AtomicUsize::new(0),
            script,
        }
    }
}

impl Respond for ScriptedStatus {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.hits.fetch_add(1, Ordering::SeqCst);
        let body = &self.script[n.min(self.script.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body.clone())
    }
}

fn pending(progress: u8, msg: &str) -> serde_json::Value {
    serde_json::json!({
        "code": 10000,
        "data": { "status": 1, "progress": progress, "msg": msg, "result": null }
    })
}

fn config_for(server: &MockServer, timeout_seconds: u64, poll_interval_seconds: u64) -> RemoteTaskConfig {
    RemoteTaskConfig {
        base_url: format!("{}/easy", server.uri()),
        result_base_url: "http://files.local".to_string(),
        timeout_seconds,
        poll_interval_seconds,
    }
}

#[tokio::test]
async fn test_pending_then_done_yields_result_url_and_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .and(query_param("code", "task-1"))
        .respond_with(ScriptedStatus::new(vec![
            pending(10, "preparing"),
            pending(60, "rendering"),
            serde_json::json!({
                "code": 10000,
                "data": { "status": 2, "progress": 100, "msg": "", "result": "/r/1" }
            }),
        ]))
        .mount(&server)
        .await;

    let client = RemoteTaskClient::new(config_for(&server, 30, 0));

    let mut progress_log: Vec<(u8, String)> = Vec::new();
    let mut on_progress = |p: u8, msg: &str| progress_log.push((p, msg.to_string()));
    let url = client
        .wait_for_completion("task-1", Some(&mut on_progress))
        .await
        .unwrap();

    assert_eq!(url, "http://files.local/r/1");
    assert_eq!(
        progress_log,
        vec![(10, "preparing".to_string()), (60, "rendering".to_string())]
    );
}

#[tokio::test]
async fn test_failed_task_surfaces_service_message_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 10000,
            "data": { "status": 3, "progress": 0, "msg": "quota exceeded", "result": null }
        })))
        .mount(&server)
        .await;

    let client = RemoteTaskClient::new(config_for(&server, 30, 0));
    let result = client.wait_for_completion("task-2", None).await;

    match result {
        Err(RemoteTaskError::TaskFailed(msg)) => assert_eq!(msg, "quota exceeded"),
        other => panic!("expected task failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attempt_budget_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .respond_with(ScriptedStatus::new(vec![pending(50, "slow")]))
        .expect(5)
        .mount(&server)
        .await;

    // Zero interval keeps the test fast; the budget degenerates to
    // timeout / max(interval, 1) = 5 attempts.
    let client = RemoteTaskClient::new(config_for(&server, 5, 0));
    let result = client.wait_for_completion("task-3", None).await;

    match result {
        Err(RemoteTaskError::Timeout(attempts)) => assert_eq!(attempts, 5),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_failure_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = RemoteTaskClient::new(config_for(&server, 30, 0));
    let result = client.wait_for_completion("task-4", None).await;

    // One failed query ends the wait; no retry under the budget.
    assert!(matches!(result, Err(RemoteTaskError::Query(_))));
}

#[tokio::test]
async fn test_unexpected_envelope_code_is_unrecognized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 9999,
            "msg": "bad signature"
        })))
        .mount(&server)
        .await;

    let client = RemoteTaskClient::new(config_for(&server, 30, 0));
    let result = client.check_task_status("task-5").await;

    match result {
        Err(RemoteTaskError::Unrecognized(msg)) => assert_eq!(msg, "bad signature"),
        other => panic!("expected unrecognized response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_done_without_result_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/easy/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 10000,
            "data": { "status": 2, "progress": 100, "msg": "", "result": "" }
        })))
        .mount(&server)
        .await;

    let client = RemoteTaskClient::new(config_for(&server, 30, 0));
    let result = client.wait_for_completion("task-6", None).await;

    assert!(matches!(result, Err(RemoteTaskError::MissingResult)));
}
