//! Integration tests for the editing session.
//!
//! These tests verify the autosave pipeline end-to-end against a local
//! stub backend: debounce coalescing, optimistic create reconciliation,
//! rollback, and the shutdown flush.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use courseapi::client::CourseApiClient;
use courseapi::model::CourseSnapshot;
use courseapi::payloads::{ObjectivePatch, SubTaskPatch, TriageItemPatch};
use objwizard::config::AutosaveConfig;
use objwizard::session::{SessionError, SessionEvent, SessionHandle, SessionState, is_temp_id};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: Option<serde_json::Value>,
}

#[derive(Clone)]
struct Stub {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Recorded> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let requests = self.recorded();
            if requests.len() >= count {
                return requests;
            }
            if tokio::time::Instant::now() > deadline {
                panic!(
                    "expected {} requests, saw {} before timeout: {:?}",
                    count,
                    requests.len(),
                    requests
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Start a one-thread HTTP stub. The responder maps each request to a
/// `(status, body)` pair; every request is recorded for assertions.
fn spawn_stub<F>(responder: F) -> Stub
where
    F: Fn(&Recorded) -> (u16, String) + Send + 'static,
{
    let server = tiny_http::Server::http("127.0.0.1:0").expect("stub server failed to bind");
    let addr = server.server_addr().to_ip().expect("stub address");
    let base_url = format!("http://{}", addr);
    let requests: Arc<Mutex<Vec<Recorded>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            let recorded = Recorded {
                method: request.method().to_string().to_uppercase(),
                path: request.url().to_string(),
                body: serde_json::from_str(&raw).ok(),
            };
            let (status, body) = responder(&recorded);
            seen.lock().unwrap().push(recorded);
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });

    Stub { base_url, requests }
}

const SNAPSHOT_JSON: &str = r#"{
    "courseId": "c1",
    "title": "Vitals 101",
    "gap": {"knowledge": true, "skill": true},
    "triageItems": [
        {"id":"t1","courseId":"c1","text":"Chart vitals","column":"must","source":"TaskAnalysis","sortOrder":0},
        {"id":"t9","courseId":"c1","text":"Handoff notes","column":"should","source":"Custom","sortOrder":1},
        {"id":"t2","courseId":"c1","text":"Escalate","column":"nice","source":"NA","sortOrder":2}
    ],
    "subTasks": [
        {"id":"s1","parentItemId":"t1","text":"Find the chart","isNew":"New","sortOrder":0}
    ],
    "objectives": [
        {"id":"o1","priority":"Should Have","linkedTaskId":"t9","sortOrder":0}
    ],
    "audiences": ["the new floor nurse"]
}"#;

fn seeded_state() -> SessionState {
    let snapshot: CourseSnapshot = serde_json::from_str(SNAPSHOT_JSON).expect("fixture snapshot");
    SessionState::from_snapshot(snapshot)
}

fn session_against(stub: &Stub, debounce_ms: u64) -> SessionHandle {
    let client =
        CourseApiClient::new(stub.base_url.as_str(), Duration::from_secs(5)).expect("client");
    let autosave = AutosaveConfig {
        debounce_ms,
        request_timeout_ms: 2_000,
        teardown_wait_ms: 2_000,
    };
    SessionHandle::spawn(seeded_state(), client, autosave)
}

// =============================================================================
// Debounce Tests
// =============================================================================

#[tokio::test]
async fn test_rapid_edits_coalesce_into_one_patch() {
    let stub = spawn_stub(|_| (200, "{}".to_string()));
    let session = session_against(&stub, 120);

    for text in ["Chart", "Chart the", "Chart the vitals"] {
        let patch = TriageItemPatch {
            text: Some(text.to_string()),
            ..Default::default()
        };
        session.update_triage_item("t1", patch).await.expect("update");
    }

    let requests = stub.wait_for(1, Duration::from_secs(3)).await;
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].path, "/api/courses/c1/triage-items/t1");
    assert_eq!(requests[0].body.as_ref().unwrap()["text"], "Chart the vitals");

    // The coalesced write is the only one.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(stub.recorded().len(), 1);

    session.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_each_entity_flushes_on_its_own_timer() {
    let stub = spawn_stub(|_| (200, "{}".to_string()));
    let session = session_against(&stub, 120);

    session
        .update_triage_item(
            "t1",
            TriageItemPatch {
                text: Some("Chart all vitals".into()),
                ..Default::default()
            },
        )
        .await
        .expect("item update");
    session
        .update_sub_task("s1", SubTaskPatch::text("Locate the chart"))
        .await
        .expect("sub update");

    let requests = stub.wait_for(2, Duration::from_secs(3)).await;
    let mut paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/api/courses/c1/triage-items/t1",
            "/api/courses/c1/triage-items/t1/sub-tasks/s1",
        ]
    );
    assert!(requests.iter().all(|r| r.method == "PATCH"));

    session.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_remove_cancels_pending_patch() {
    let stub = spawn_stub(|_| (200, "{}".to_string()));
    let session = session_against(&stub, 300);

    session
        .update_triage_item(
            "t9",
            TriageItemPatch {
                text: Some("never sent".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    session.remove_triage_item("t9").await.expect("remove");

    let requests = stub.wait_for(1, Duration::from_secs(3)).await;
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/api/courses/c1/triage-items/t9");

    // The pending PATCH died with the entity.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(stub.recorded().len(), 1);

    session.shutdown().await.expect("shutdown");
}

// =============================================================================
// Create Reconciliation Tests
// =============================================================================

#[tokio::test]
async fn test_optimistic_create_reconciles_to_server_id() {
    let stub = spawn_stub(|req| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/api/courses/c1/objectives") => {
            // Hold the create open long enough for edits to land on the
            // temp entity.
            thread::sleep(Duration::from_millis(150));
            (201, r#"{"id":"srv-o2"}"#.to_string())
        }
        _ => (200, "{}".to_string()),
    });
    let session = session_against(&stub, 100);
    let mut events = session.subscribe_events();

    let temp_id = session.add_objective(Some("t1".into())).await.expect("add");
    assert!(is_temp_id(&temp_id));

    // Edit while the create is still in flight.
    session
        .update_objective(
            &temp_id,
            ObjectivePatch {
                verb: Some("identify".into()),
                behavior: Some("identify abnormal vitals".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    // Visible immediately under the temp id.
    let state = session.snapshot().await.expect("snapshot");
    let obj = state.objective(&temp_id).expect("optimistic objective");
    assert_eq!(obj.verb, "identify");

    let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
        .await
        .expect("confirm timeout")
        .expect("event stream");
    match event {
        SessionEvent::CreateConfirmed { temp_id: t, id, .. } => {
            assert_eq!(t, temp_id);
            assert_eq!(id, "srv-o2");
        }
        other => panic!("expected confirmation, got {:?}", other),
    }

    let state = session.snapshot().await.expect("snapshot");
    assert!(state.objective(&temp_id).is_none());
    let obj = state.objective("srv-o2").expect("reconciled objective");
    assert_eq!(obj.verb, "identify");
    assert_eq!(obj.linked_task_id.as_deref(), Some("t1"));

    // The buffered edit goes out as a PATCH against the server id, and
    // nothing ever addresses the temp id on the wire.
    let requests = stub.wait_for(2, Duration::from_secs(3)).await;
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body.as_ref().unwrap()["linkedTaskId"], "t1");
    assert_eq!(requests[1].method, "PATCH");
    assert_eq!(requests[1].path, "/api/courses/c1/objectives/srv-o2");
    assert_eq!(requests[1].body.as_ref().unwrap()["verb"], "identify");
    assert!(requests.iter().all(|r| !r.path.contains("tmp-")));

    session.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_rejected_create_rolls_back_local_state() {
    let stub = spawn_stub(|req| match req.method.as_str() {
        "POST" => (422, "course is archived".to_string()),
        _ => (200, "{}".to_string()),
    });
    let session = session_against(&stub, 100);
    let mut events = session.subscribe_events();

    let temp_id = session.add_triage_item("Doomed item").await.expect("add");
    let state = session.snapshot().await.expect("snapshot");
    assert!(state.triage_item(&temp_id).is_some());

    let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
        .await
        .expect("reject timeout")
        .expect("event stream");
    assert!(
        matches!(event, SessionEvent::CreateRejected { temp_id: ref t, .. } if *t == temp_id),
        "expected rejection, got {:?}",
        event
    );

    let state = session.snapshot().await.expect("snapshot");
    assert!(state.triage_item(&temp_id).is_none());
    assert_eq!(stub.recorded().len(), 1);

    session.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_delete_while_create_in_flight_compensates() {
    let stub = spawn_stub(|req| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/api/courses/c1/triage-items") => {
            thread::sleep(Duration::from_millis(200));
            (201, r#"{"id":"srv-t5"}"#.to_string())
        }
        _ => (200, "{}".to_string()),
    });
    let session = session_against(&stub, 100);

    let temp_id = session.add_triage_item("Fleeting topic").await.expect("add");
    session.remove_triage_item(&temp_id).await.expect("remove");

    let state = session.snapshot().await.expect("snapshot");
    assert!(state.triage_item(&temp_id).is_none());

    // Once the create lands, the server copy is deleted right away.
    let requests = stub.wait_for(2, Duration::from_secs(3)).await;
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].path, "/api/courses/c1/triage-items/srv-t5");

    session.shutdown().await.expect("shutdown");
}

// =============================================================================
// Seeding Tests
// =============================================================================

#[tokio::test]
async fn test_seed_creates_objectives_for_uncovered_items() {
    let stub = spawn_stub(|req| match req.method.as_str() {
        "POST" => (201, r#"{"id":"srv-o9"}"#.to_string()),
        _ => (200, "{}".to_string()),
    });
    let session = session_against(&stub, 100);
    let mut events = session.subscribe_events();

    // t9 is covered by o1 and t2 is parked, so only t1 needs seeding.
    let created = session.seed_uncovered().await.expect("seed");
    assert_eq!(created.len(), 1);

    let event = tokio::time::timeout(Duration::from_secs(3), events.recv())
        .await
        .expect("confirm timeout")
        .expect("event stream");
    assert!(matches!(event, SessionEvent::CreateConfirmed { .. }));

    let requests = stub.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/courses/c1/objectives");
    let sent = requests[0].body.as_ref().unwrap();
    assert_eq!(sent["linkedTaskId"], "t1");
    assert_eq!(sent["priority"], "Should Have");
    assert_eq!(sent["sortOrder"], 1);

    let state = session.snapshot().await.expect("snapshot");
    let seeded = state.objective("srv-o9").expect("seeded objective");
    assert_eq!(seeded.linked_task_id.as_deref(), Some("t1"));

    // A second pass finds nothing left to cover.
    let again = session.seed_uncovered().await.expect("seed again");
    assert!(again.is_empty());

    session.shutdown().await.expect("shutdown");
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[tokio::test]
async fn test_shutdown_delivers_pending_writes() {
    let stub = spawn_stub(|_| (200, "{}".to_string()));
    // A debounce far longer than the test, so only teardown can deliver.
    let session = session_against(&stub, 60_000);

    session
        .update_sub_task("s1", SubTaskPatch::text("final wording"))
        .await
        .expect("update");
    session.set_gap(false, true).await.expect("gap");

    session.shutdown().await.expect("shutdown");

    let requests = stub.wait_for(2, Duration::from_secs(3)).await;
    let mut paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/api/courses/c1/gap",
            "/api/courses/c1/triage-items/t1/sub-tasks/s1",
        ]
    );
}

#[tokio::test]
async fn test_guard_rails_surface_as_errors() {
    let stub = spawn_stub(|_| (200, "{}".to_string()));
    let session = session_against(&stub, 120);

    // Analysis-owned items cannot be deleted.
    let err = session.remove_triage_item("t1").await.unwrap_err();
    assert!(matches!(err, SessionError::NotEditable(_)));

    // Parked items cannot be broken down.
    let err = session.add_sub_task("t2", "too soon").await.unwrap_err();
    assert!(matches!(err, SessionError::NotEditable(_)));

    // Unknown ids are reported as such.
    let err = session
        .update_sub_task("missing", SubTaskPatch::text("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));

    // Nothing reached the wire.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(stub.recorded().is_empty());

    session.shutdown().await.expect("shutdown");
}
