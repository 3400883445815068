//! Integration tests for lto-tr API endpoints
//!
//! Drive the full router with `oneshot`: upload, session inspection, edit,
//! archive download, session reset, plus the health and UI routes.

use std::io::{Cursor, Read};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lto_common::config::ServiceConfig;
use lto_tr::{build_router, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "lto-test-boundary";

/// Test helper: app with default config
fn setup_app() -> Router {
    build_router(AppState::new(ServiceConfig::default()))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: multipart upload with one `files` part per entry
fn upload_request(files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn edit_request(op: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/edit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(op.to_string()))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

fn example_files() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("Track_keyAm_90bpm.wav", b"RIFF-am-90"),
        ("Track_keyC_120bpm.wav", b"RIFF-c-120"),
        ("loop.wav", b"RIFF-loop"),
        ("Track_keyG_90bpm.wav", b"RIFF-g-90"),
    ]
}

fn final_names(view: &Value) -> Vec<String> {
    view["files"]
        .as_array()
        .expect("files array")
        .iter()
        .map(|f| f["final_name"].as_str().unwrap().to_string())
        .collect()
}

fn zip_members(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("Should open zip");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

// =============================================================================
// Health, build info and UI
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = setup_app().oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lto-tr");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_i64());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let response = setup_app()
        .oneshot(test_request("GET", "/api/buildinfo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn test_index_served() {
    let response = setup_app().oneshot(test_request("GET", "/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("LANDR Track Order"));
    assert!(html.contains("accept=\".wav\""));
}

#[tokio::test]
async fn test_app_js_served_as_javascript() {
    let response = setup_app()
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
}

// =============================================================================
// Upload and session
// =============================================================================

#[tokio::test]
async fn test_session_missing_before_upload() {
    let response = setup_app()
        .oneshot(test_request("GET", "/api/session"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upload_orders_and_renames() {
    let app = setup_app();

    let response = app
        .clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = extract_json(response.into_body()).await;
    assert_eq!(view["uploads"].as_array().unwrap().len(), 4);
    assert_eq!(view["uploads"][2]["original_name"], "loop.wav");
    assert_eq!(view["uploads"][2]["status"], "not_parsed");
    assert_eq!(view["uploads"][0]["status"], "parsed");
    assert_eq!(view["uploads"][0]["bpm"], 90);
    assert_eq!(view["uploads"][0]["key"], "Am");

    assert_eq!(
        final_names(&view),
        vec![
            "Track_01_keyG_90bpm.wav",
            "Track_02_keyAm_90bpm.wav",
            "Track_03_keyC_120bpm.wav",
        ]
    );
    assert_eq!(view["edit"]["operation"], "remove");
    assert_eq!(view["error_occurred"], false);
    assert_eq!(view["download_ready"], true);
    assert_eq!(view["archive_name"], "landr_ordered_renamed_tracks.zip");

    let diagnostics = view["diagnostics"].as_array().unwrap();
    assert!(diagnostics
        .iter()
        .any(|d| d["stage"] == "parse" && d["file"] == "loop.wav"));

    // Same state is visible through GET
    let response = app.oneshot(test_request("GET", "/api/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = extract_json(response.into_body()).await;
    assert_eq!(fetched["session_id"], view["session_id"]);
}

#[tokio::test]
async fn test_upload_without_files_rejected() {
    let response = setup_app().oneshot(upload_request(&[])).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_new_upload_resets_edit() {
    let app = setup_app();

    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(edit_request(json!({"operation": "remove", "start": 6, "count": 3})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(upload_request(&[("Kick_keyE_140bpm.wav", b"RIFF-kick")]))
        .await
        .unwrap();
    let view = extract_json(response.into_body()).await;

    assert_eq!(view["edit"]["operation"], "remove");
    assert_eq!(view["edit"]["count"], 0);
    assert_eq!(final_names(&view), vec!["Kick_01_keyE_140bpm.wav"]);
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let config = ServiceConfig {
        max_upload_bytes: 256,
        ..ServiceConfig::default()
    };
    let app = build_router(AppState::new(config));

    let big = vec![0u8; 4096];
    let response = app
        .oneshot(upload_request(&[("Big_keyC_120bpm.wav", &big)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_clear_session() {
    let app = setup_app();

    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/api/session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(test_request("GET", "/api/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_edit_remove_range() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let response = app
        .oneshot(edit_request(json!({"operation": "remove", "start": 6, "count": 3})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = extract_json(response.into_body()).await;
    assert_eq!(
        final_names(&view),
        vec![
            "Track_keyG_90bpm.wav",
            "Track_keyAm_90bpm.wav",
            "Track_keyC_120bpm.wav",
        ]
    );
    assert_eq!(view["error_occurred"], false);
    let markup = view["files"][0]["preview_markup"].as_str().unwrap();
    assert!(markup.contains("<span class=\"removed\">_01</span>"));
}

#[tokio::test]
async fn test_edit_add_text() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&[("Kick_keyE_140bpm.wav", b"RIFF-kick")]))
        .await
        .unwrap();

    let response = app
        .oneshot(edit_request(json!({"operation": "add", "position": 1, "text": "X_"})))
        .await
        .unwrap();
    let view = extract_json(response.into_body()).await;

    assert_eq!(final_names(&view), vec!["X_Kick_01_keyE_140bpm.wav"]);
    let markup = view["files"][0]["preview_markup"].as_str().unwrap();
    assert!(markup.contains("<span class=\"inserted\">X_</span>"));
}

#[tokio::test]
async fn test_edit_out_of_range_keeps_name_and_flags_error() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let response = app
        .oneshot(edit_request(
            json!({"operation": "replace", "start": 40, "count": 2, "text": "Z"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = extract_json(response.into_body()).await;
    assert_eq!(view["error_occurred"], true);
    assert_eq!(
        final_names(&view),
        vec![
            "Track_01_keyG_90bpm.wav",
            "Track_02_keyAm_90bpm.wav",
            "Track_03_keyC_120bpm.wav",
        ]
    );
    assert!(view["files"]
        .as_array()
        .unwrap()
        .iter()
        .all(|f| f["valid"] == false));
    // Names are still downloadable as shown
    assert_eq!(view["download_ready"], true);
}

#[tokio::test]
async fn test_edit_start_below_one_rejected() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let response = app
        .oneshot(edit_request(json!({"operation": "remove", "start": 0, "count": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_edit_malformed_body_rejected_with_error_envelope() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let bodies = [
        json!({"operation": "remove", "start": 2, "count": -1}),
        json!({"operation": "rotate", "start": 1, "count": 1}),
        json!({"start": 1, "count": 1}),
    ];
    for body in bodies {
        let response = app.clone().oneshot(edit_request(body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);

        let error = extract_json(response.into_body()).await;
        assert_eq!(error["error"]["code"], "BAD_REQUEST");
        assert!(error["error"]["message"].is_string());
    }

    // Session edit is untouched
    let response = app.oneshot(test_request("GET", "/api/session")).await.unwrap();
    let view = extract_json(response.into_body()).await;
    assert_eq!(view["edit"]["count"], 0);
}

#[tokio::test]
async fn test_edit_leaving_archive_root_keeps_names() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&[("A_keyC_90bpm.wav", b"RIFF-a")]))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(edit_request(json!({"operation": "add", "position": 1, "text": "../../evil/"})))
        .await
        .unwrap();
    let view = extract_json(response.into_body()).await;
    assert_eq!(final_names(&view), vec!["A_01_keyC_90bpm.wav"]);
    assert_eq!(view["files"][0]["valid"], false);
    assert_eq!(view["error_occurred"], true);

    let response = app
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let members = zip_members(body_bytes(response.into_body()).await);
    assert_eq!(members, vec![("A_01_keyC_90bpm.wav".to_string(), b"RIFF-a".to_vec())]);
}

#[tokio::test]
async fn test_edit_without_session_not_found() {
    let response = setup_app()
        .oneshot(edit_request(json!({"operation": "remove", "start": 1, "count": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Download
// =============================================================================

#[tokio::test]
async fn test_download_archive_contents() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let response = app
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"landr_ordered_renamed_tracks.zip\""
    );

    let members = zip_members(body_bytes(response.into_body()).await);
    assert_eq!(
        members,
        vec![
            ("Track_01_keyG_90bpm.wav".to_string(), b"RIFF-g-90".to_vec()),
            ("Track_02_keyAm_90bpm.wav".to_string(), b"RIFF-am-90".to_vec()),
            ("Track_03_keyC_120bpm.wav".to_string(), b"RIFF-c-120".to_vec()),
        ]
    );
}

#[tokio::test]
async fn test_download_uses_edited_names() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();
    app.clone()
        .oneshot(edit_request(json!({"operation": "remove", "start": 6, "count": 3})))
        .await
        .unwrap();

    let response = app
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    let names: Vec<String> = zip_members(body_bytes(response.into_body()).await)
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    assert_eq!(
        names,
        vec![
            "Track_keyG_90bpm.wav",
            "Track_keyAm_90bpm.wav",
            "Track_keyC_120bpm.wav",
        ]
    );
}

#[tokio::test]
async fn test_download_is_deterministic() {
    let app = setup_app();
    app.clone()
        .oneshot(upload_request(&example_files()))
        .await
        .unwrap();

    let first = app
        .clone()
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    let first = body_bytes(first.into_body()).await;

    let second = app
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    let second = body_bytes(second.into_body()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_download_without_session_conflict() {
    let response = setup_app()
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_download_with_nothing_sequenced_conflict() {
    let app = setup_app();
    let response = app
        .clone()
        .oneshot(upload_request(&[("loop.wav", b"RIFF-loop")]))
        .await
        .unwrap();
    let view = extract_json(response.into_body()).await;
    assert_eq!(view["download_ready"], false);
    assert!(view["files"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(test_request("GET", "/api/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
