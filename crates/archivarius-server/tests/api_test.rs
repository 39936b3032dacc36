use archivarius_core::BuildOptions;
use archivarius_server::{router, AppState};
use archivarius_testing::assertions::assert_dir_files;
use archivarius_testing::fixtures::{create_numbered_files, numbered_files};
use archivarius_testing::TestDir;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tower::ServiceExt;

fn test_state(max_jobs: usize) -> AppState {
    AppState::new(BuildOptions::default(), max_jobs, 1 << 20)
}

fn body_for(archive: &Path, dir: &Path) -> Value {
    json!({
        "file": archive.to_str().unwrap(),
        "dir": dir.to_str().unwrap(),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

async fn wait_finished(app: &Router, uri: &str, id: &str) -> Value {
    for _ in 0..500 {
        let (status, body) = send(app, Method::GET, &format!("{uri}?session_id={id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "finished" {
            return body;
        }
        assert!(body.get("result").is_none(), "result before finish: {body}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {id} did not finish");
}

#[tokio::test]
async fn test_sync_round_trip() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12])
        .unwrap();
    let archive = test_dir.join("archive.zip");
    let dst = test_dir.join("dst");
    let app = router(test_state(4));

    let (status, body) = post(&app, "/api/v1/compress", &body_for(&archive, &src)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let mut request = body_for(&archive, &dst);
    request["limit"] = json!(3);
    let (status, body) = post(&app, "/api/v1/extract", &request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    assert_dir_files(&dst, &numbered_files(&[10, 11, 12]).unwrap()).unwrap();
}

#[tokio::test]
async fn test_sync_failures_map_to_status_codes() {
    let test_dir = TestDir::new().unwrap();
    let app = router(test_state(4));

    let (status, body) = post(
        &app,
        "/api/v1/compress",
        &body_for(&test_dir.join("a.zip"), &test_dir.join("missing")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "nok");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("unable to process ("));

    let src = create_numbered_files(&test_dir, "src", &[1]).unwrap();
    test_dir.create_file("blocker", b"not a directory").unwrap();
    let (status, body) = post(
        &app,
        "/api/v1/compress",
        &body_for(&test_dir.join("blocker/a.zip"), &src),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("blocker"));
    assert!(!test_dir.join("blocker").is_dir());

    let mut request = body_for(&test_dir.join("b.zip"), &src);
    request["filter"] = json!("[a-");
    let (status, _) = post(&app, "/api/v1/compress", &request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body() {
    let state = test_state(4);
    let app = router(state.clone());

    for uri in ["/api/v1/compress", "/api/v1/extract/async"] {
        let (status, body) =
            send(&app, Method::POST, uri, Some("{\"file\": 12".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "nok");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("incorrect request format ("));
    }

    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let state = AppState::new(BuildOptions::default(), 4, 16);
    let app = router(state.clone());
    let request = json!({ "file": "x".repeat(64), "dir": "y" });

    for uri in ["/api/v1/compress", "/api/v1/extract/async"] {
        let (status, body) = post(&app, uri, &request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{uri}");
        assert_eq!(body["status"], "nok");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("unable to read request body ("));
    }
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_async_lifecycle() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[2, 4, 6]).unwrap();
    let archive = test_dir.join("async.zip");
    let uri = "/api/v1/compress/async";
    let state = test_state(4);
    let app = router(state.clone());

    let (status, body) = post(&app, uri, &body_for(&archive, &src)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let id = body["session_id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let body = wait_finished(&app, uri, &id).await;
    assert_eq!(
        body["result"],
        json!({ "status_code": 200, "response": { "status": "ok" } })
    );
    assert!(archive.exists());

    let (status, _) = send(&app, Method::DELETE, &format!("{uri}?session_id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.sessions.is_empty());

    let (status, _) = send(&app, Method::GET, &format!("{uri}?session_id={id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("{uri}?session_id={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_async_result_matches_sync() {
    let test_dir = TestDir::new().unwrap();
    let app = router(test_state(4));
    let request = body_for(&test_dir.join("missing.zip"), &test_dir.join("dst"));

    let (sync_status, sync_body) = post(&app, "/api/v1/extract", &request).await;

    let (_, body) = post(&app, "/api/v1/extract/async", &request).await;
    let id = body["session_id"].as_str().unwrap().to_string();
    let body = wait_finished(&app, "/api/v1/extract/async", &id).await;

    assert_eq!(body["result"]["status_code"], sync_status.as_u16());
    assert_eq!(body["result"]["response"], sync_body);
}

#[tokio::test]
async fn test_unknown_session() {
    let app = router(test_state(4));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/extract/async?session_id=does-not-exist",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "nok");

    let (status, _) = send(&app, Method::GET, "/api/v1/extract/async", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/v1/extract/async?session_id=does-not-exist",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unsupported_methods() {
    let app = router(test_state(4));

    for (method, uri) in [
        (Method::GET, "/api/v1/compress"),
        (Method::PUT, "/api/v1/extract"),
        (Method::PUT, "/api/v1/compress/async"),
        (Method::PATCH, "/api/v1/extract/async"),
    ] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
}

#[tokio::test]
async fn test_waiting_jobs_stay_created() {
    let test_dir = TestDir::new().unwrap();
    let src = create_numbered_files(&test_dir, "src", &[1, 2]).unwrap();
    let uri = "/api/v1/compress/async";
    let state = test_state(1);
    let app = router(state.clone());

    let gate = state.job_gate.clone().unwrap();
    let permit = gate.acquire_owned().await.unwrap();

    let (_, body) = post(&app, uri, &body_for(&test_dir.join("gated.zip"), &src)).await;
    let id = body["session_id"].as_str().unwrap().to_string();

    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let (_, body) = send(&app, Method::GET, &format!("{uri}?session_id={id}"), None).await;
        assert_eq!(body, json!({ "status": "created" }));
    }
    assert!(!test_dir.join("gated.zip").exists());

    drop(permit);
    let body = wait_finished(&app, uri, &id).await;
    assert_eq!(body["result"]["status_code"], 200);
}
