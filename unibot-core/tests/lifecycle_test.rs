use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use unibot_core::{
    AgentController, CommandOutcome, HttpAgentBackend, Secret, SessionStore, SessionToken,
    StartRequest, TickOutcome,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_with_store(server: &MockServer, store: SessionStore) -> AgentController {
    let backend = HttpAgentBackend::new(
        &server.uri(),
        Duration::from_secs(5),
        Duration::from_secs(1),
    )
    .unwrap();
    AgentController::new(Arc::new(backend), store)
}

fn controller(server: &MockServer) -> AgentController {
    controller_with_store(server, SessionStore::in_memory())
}

fn idle_status() -> serde_json::Value {
    json!({"running": false, "current_lesson": null, "last_run": null, "log_count": 0})
}

fn running_status(log_count: u64) -> serde_json::Value {
    json!({"running": true, "current_lesson": "191", "last_run": null, "log_count": log_count})
}

fn request() -> StartRequest {
    StartRequest::new("a@x.com", Secret::new("p"), "191")
}

async fn mount_idle_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(idle_status()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_lesson_run_end_to_end() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    // Before any session exists.
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(idle_status()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/agent/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_id": "S1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .and(query_param("session_id", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status(2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .and(query_param("session_id", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "running": false,
            "current_lesson": null,
            "last_run": "T",
            "log_count": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/logs"))
        .and(query_param("session_id", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["step1", "step2"])))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_with_store(&server, SessionStore::open(&state_path));
    assert_eq!(
        controller.refresh_status().await,
        TickOutcome::Applied { logs_synced: false }
    );

    assert_eq!(controller.start_single(request()).await, CommandOutcome::Completed);

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.session.as_ref().map(|s| s.as_str()), Some("S1"));
    assert!(snapshot.status.as_ref().unwrap().running);
    assert_eq!(snapshot.logs, vec!["step1", "step2"]);
    assert!(snapshot.was_running);
    assert!(snapshot.error.is_none());

    assert_eq!(
        controller.refresh_status().await,
        TickOutcome::Finished { logs_synced: false }
    );
    let snapshot = controller.snapshot().await;
    assert!(!snapshot.was_running);
    assert_eq!(snapshot.display_status.last_run.as_deref(), Some("T"));
    assert_eq!(snapshot.logs, vec!["step1", "step2"]);

    let reopened = SessionStore::open(&state_path);
    assert_eq!(reopened.current().unwrap().as_str(), "S1");
    assert_eq!(reopened.last_account(), Some("a@x.com"));
    let raw = std::fs::read_to_string(&state_path).unwrap();
    assert!(!raw.contains("\"p\""));
}

#[tokio::test]
async fn test_restored_session_is_resumed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .and(query_param("session_id", "S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["resumed"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SessionStore::in_memory();
    store.set_current(&SessionToken::new("S1").unwrap()).unwrap();
    let controller = controller_with_store(&server, store);

    controller.refresh_status().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.logs, vec!["resumed"]);
    assert!(controller.read(|s| s.can_stop()).await);
}

#[tokio::test]
async fn test_logs_are_not_fetched_without_activity() {
    let server = MockServer::start().await;
    mount_idle_status(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/agent/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut store = SessionStore::in_memory();
    store.set_current(&SessionToken::new("S1").unwrap()).unwrap();
    let controller = controller_with_store(&server, store);

    controller.refresh_status().await;
    controller.refresh_status().await;
}

#[tokio::test]
async fn test_logs_are_not_fetched_without_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller(&server);
    assert_eq!(
        controller.refresh_status().await,
        TickOutcome::Applied { logs_synced: false }
    );
}

#[tokio::test]
async fn test_concurrent_stop_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status(0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agent/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/agent/stop"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SessionStore::in_memory();
    store.set_current(&SessionToken::new("S1").unwrap()).unwrap();
    let controller = controller_with_store(&server, store);
    controller.refresh_status().await;

    let (first, second) = tokio::join!(controller.stop(), controller.stop());
    let outcomes = [first, second];
    assert!(outcomes.contains(&CommandOutcome::Completed));
    assert!(outcomes.contains(&CommandOutcome::Skipped));
}

#[tokio::test]
async fn test_concurrent_start_is_sent_once() {
    let server = MockServer::start().await;
    mount_idle_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/agent/start"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"session_id": "S1"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller(&server);
    controller.refresh_status().await;

    let (first, second) = tokio::join!(
        controller.start_single(request()),
        controller.start_single(request())
    );
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_failed_start_keeps_previous_session() {
    let server = MockServer::start().await;
    mount_idle_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/agent/start"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let mut store = SessionStore::in_memory();
    store.set_current(&SessionToken::new("OLD").unwrap()).unwrap();
    let controller = controller_with_store(&server, store);
    controller.refresh_status().await;

    let outcome = controller.start_single(request()).await;
    assert_eq!(outcome, CommandOutcome::Failed("Invalid credentials".to_string()));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.session.unwrap().as_str(), "OLD");
    assert_eq!(snapshot.error.as_deref(), Some("Invalid credentials"));
    assert!(!snapshot.busy);
    assert!(!snapshot.was_running);
}

#[tokio::test]
async fn test_incomplete_form_sends_nothing() {
    let server = MockServer::start().await;
    mount_idle_status(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_id": "S1"})))
        .expect(0)
        .mount(&server)
        .await;

    let controller = controller(&server);
    controller.refresh_status().await;

    let blank_lesson = StartRequest::new("a@x.com", Secret::new("p"), "   ");
    assert_eq!(controller.start_batch(blank_lesson).await, CommandOutcome::Skipped);
    assert_eq!(controller.stop().await, CommandOutcome::Skipped);
}

#[tokio::test]
async fn test_non_json_status_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agent/status"))
        .respond_with(
            ResponseTemplate::new(502)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>Bad Gateway</html>"),
        )
        .mount(&server)
        .await;

    let controller = controller(&server);
    let outcome = controller.refresh_status().await;
    assert!(matches!(outcome, TickOutcome::Failed(ref m) if m.contains("non-JSON response (502)")));

    let snapshot = controller.snapshot().await;
    assert!(snapshot.status.is_none());
    assert!(snapshot.error.unwrap().contains("Check backend/proxy configuration"));
}
