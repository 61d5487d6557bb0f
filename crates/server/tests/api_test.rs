// crates/server/tests/api_test.rs
//! End-to-end tests: a storage tree on disk, served through the HTTP API.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tempfile::TempDir;
use tower::ServiceExt;

use agentdeck_core::Thresholds;
use agentdeck_server::{create_app, AppState};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_millis() as i64
}

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), content).unwrap();
}

fn app_over(storage_root: PathBuf) -> (Router, Arc<AppState>) {
    let state = AppState::new(storage_root, Thresholds::default());
    (create_app(state.clone(), None), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

/// One session with a generic title, a user message asking for an auth
/// fix, and an assistant reply in progress.
fn seed_auth_session(root: &Path, updated: i64) {
    write_file(
        &root.join("session").join("my-app"),
        "ses_auth.json",
        &format!(
            r#"{{"id":"ses_auth","slug":"auth","title":"New session - 2026-01-28T10:16:06.133Z","directory":"/home/u/dev/my-app","time":{{"updated":{updated}}},"summary":{{"additions":12,"deletions":3,"files":2}}}}"#
        ),
    );
    write_file(
        &root.join("message").join("ses_auth"),
        "msg_001.json",
        r#"{"id":"msg_001","role":"user","agent":"build","time":{"created":1000}}"#,
    );
    write_file(
        &root.join("message").join("ses_auth"),
        "msg_002.json",
        r#"{"id":"msg_002","role":"assistant","time":{"created":2000}}"#,
    );
    write_file(
        &root.join("part").join("msg_001"),
        "prt_001.json",
        r#"{"type":"text","text":"Fix auth bug. Detail about the SSO flow.\n\nRepro steps follow."}"#,
    );
    write_file(
        &root.join("part").join("msg_002"),
        "prt_001.json",
        r#"{"type":"tool","state":{"input":{"description":"Inspect the token refresh handler"}}}"#,
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp = TempDir::new().unwrap();
    let (app, _) = app_over(temp.path().to_path_buf());

    let (status, json) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_sessions_empty_storage() {
    let temp = TempDir::new().unwrap();
    let (app, _) = app_over(temp.path().to_path_buf());

    let (status, json) = get(app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_generic_title_enriched_from_first_user_message() {
    let temp = TempDir::new().unwrap();
    seed_auth_session(temp.path(), now_ms());
    let (app, _) = app_over(temp.path().to_path_buf());

    let (status, json) = get(app, "/api/sessions").await;
    assert_eq!(status, StatusCode::OK);

    let session = &json.as_array().unwrap()[0];
    assert_eq!(session["id"], "ses_auth");
    assert_eq!(session["title"], "Fix auth bug.");
    assert_eq!(session["description"], "Fix auth bug.");
    assert_eq!(session["agent"], "build");
    assert_eq!(session["status"], "busy");
    assert_eq!(session["projectName"], "my-app");
    assert_eq!(session["isSubagent"], false);
    assert_eq!(session["summary"]["additions"], 12);
}

#[tokio::test]
async fn test_non_generic_title_untouched() {
    let temp = TempDir::new().unwrap();
    write_file(
        &temp.path().join("session").join("my-app"),
        "ses_1.json",
        r#"{"id":"ses_1","title":"Build authentication system"}"#,
    );
    write_file(
        &temp.path().join("message").join("ses_1"),
        "msg_001.json",
        r#"{"id":"msg_001","role":"user","time":{"created":1000}}"#,
    );
    write_file(
        &temp.path().join("part").join("msg_001"),
        "prt_001.json",
        r#"{"type":"text","text":"Totally different text."}"#,
    );
    let (app, _) = app_over(temp.path().to_path_buf());

    let (_, json) = get(app, "/api/sessions").await;
    let session = &json.as_array().unwrap()[0];
    assert_eq!(session["title"], "Build authentication system");
    // No update timestamp on disk means effectively infinite age.
    assert_eq!(session["status"], "stale");
}

#[tokio::test]
async fn test_session_detail_carries_description_and_task() {
    let temp = TempDir::new().unwrap();
    seed_auth_session(temp.path(), now_ms());
    let (app, _) = app_over(temp.path().to_path_buf());

    let (status, json) = get(app, "/api/sessions/ses_auth").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "ses_auth");
    assert_eq!(
        json["detailedDescription"],
        "Fix auth bug. Detail about the SSO flow."
    );
    assert_eq!(json["currentTask"], "Inspect the token refresh handler");
}

#[tokio::test]
async fn test_session_detail_not_found() {
    let temp = TempDir::new().unwrap();
    let (app, _) = app_over(temp.path().to_path_buf());

    let (status, json) = get(app, "/api/sessions/ses_missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ses_missing"));
}

#[tokio::test]
async fn test_polling_twice_is_stable() {
    let temp = TempDir::new().unwrap();
    seed_auth_session(temp.path(), now_ms());
    let (app, state) = app_over(temp.path().to_path_buf());

    let (_, first) = get(app.clone(), "/api/sessions").await;
    let cached_entries = state.cache.lock().await.len();
    let (_, second) = get(app, "/api/sessions").await;

    assert_eq!(first[0]["id"], second[0]["id"]);
    assert_eq!(first[0]["title"], second[0]["title"]);
    assert_eq!(first[0]["agent"], second[0]["agent"]);
    // The second poll reused the cache instead of growing it.
    assert_eq!(state.cache.lock().await.len(), cached_entries);
}
