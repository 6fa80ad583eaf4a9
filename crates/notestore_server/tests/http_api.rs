use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use notestore_server::{build_app, ServerConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        database_url: format!("sqlite://{}", dir.path().join("notes.db").display()),
        ..ServerConfig::default()
    };
    (build_app(&config).expect("app should build"), dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    send_request(app, request).await
}

async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, note) = send(app, Method::POST, "/api/notes", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    note
}

#[tokio::test]
async fn root_and_health_report_ok() {
    let (app, _dir) = app();
    for uri in ["/", "/api/health"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

#[tokio::test]
async fn create_returns_full_representation() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "  Hello ", "content": " world " })).await;

    assert!(note["id"].as_i64().expect("id") > 0);
    assert_eq!(note["title"], "Hello");
    assert_eq!(note["content"], "world");
    assert_eq!(note["created_at"], note["updated_at"]);
    let created_at = note["created_at"].as_str().expect("timestamp string");
    assert_eq!(created_at.len(), "2024-01-01T00:00:00.000000".len());
    assert_eq!(&created_at[10..11], "T");
}

#[tokio::test]
async fn create_without_content_returns_empty_string() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "only title" })).await;
    assert_eq!(note["content"], "");

    let id = note["id"].as_i64().expect("id");
    let (status, fetched) = send(&app, Method::GET, &format!("/api/notes/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, note);
}

#[tokio::test]
async fn create_with_blank_or_missing_title_is_400_and_writes_nothing() {
    let (app, _dir) = app();
    for body in [json!({ "title": "" }), json!({ "title": "   " }), json!({})] {
        let (status, error) = send(&app, Method::POST, "/api/notes", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({ "error": "title is required" }));
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/notes")
        .body(Body::from("not json"))
        .expect("request");
    let (status, error) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({ "error": "title is required" }));

    let (_, notes) = send(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(notes, json!([]));
}

#[tokio::test]
async fn create_with_non_string_title_is_400() {
    let (app, _dir) = app();
    let body = json!({ "title": 42 });
    let (status, error) = send(&app, Method::POST, "/api/notes", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({ "error": "invalid request body" }));
}

#[tokio::test]
async fn create_with_overlong_title_is_400() {
    let (app, _dir) = app();
    let title = "x".repeat(256);
    let body = json!({ "title": title });
    let (status, error) = send(&app, Method::POST, "/api/notes", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({ "error": "title is too long" }));
}

#[tokio::test]
async fn list_returns_newest_first() {
    let (app, _dir) = app();
    let first = create(&app, json!({ "title": "t1" })).await;
    let second = create(&app, json!({ "title": "t2" })).await;
    let third = create(&app, json!({ "title": "t3" })).await;

    let (status, notes) = send(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = notes
        .as_array()
        .expect("array")
        .iter()
        .map(|note| note["id"].clone())
        .collect();
    assert_eq!(ids, vec![third["id"].clone(), second["id"].clone(), first["id"].clone()]);
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "title", "content": "old" })).await;
    let uri = format!("/api/notes/{}", note["id"]);

    let body = json!({ "content": " new " });
    let (status, updated) = send(&app, Method::PUT, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "title");
    assert_eq!(updated["content"], "new");
    assert_eq!(updated["created_at"], note["created_at"]);
    // Fixed-width timestamps compare chronologically as strings.
    assert!(updated["updated_at"].as_str() >= note["updated_at"].as_str());

    let (status, cleared) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "title": null, "content": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["title"], "title");
    assert_eq!(cleared["content"], "");
}

#[tokio::test]
async fn update_with_blank_title_is_400() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "title" })).await;
    let uri = format!("/api/notes/{}", note["id"]);

    let (status, error) = send(&app, Method::PUT, &uri, Some(json!({ "title": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({ "error": "title is required" }));
}

#[tokio::test]
async fn update_without_body_still_succeeds() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "title", "content": "body" })).await;
    let uri = format!("/api/notes/{}", note["id"]);

    let (status, updated) = send(&app, Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "title");
    assert_eq!(updated["content"], "body");
}

#[tokio::test]
async fn delete_then_get_and_delete_again_are_404() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "doomed" })).await;
    let uri = format!("/api/notes/{}", note["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "not found" }));
    }
}

#[tokio::test]
async fn missing_id_is_404_for_every_id_route() {
    let (app, _dir) = app();
    let uri = "/api/notes/999999";
    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(json!({ "title": "x" }))),
        (Method::DELETE, None),
    ] {
        let (status, error) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error, json!({ "error": "not found" }));
    }
}

#[tokio::test]
async fn update_of_missing_id_with_blank_title_is_404() {
    let (app, _dir) = app();
    let (status, error) = send(
        &app,
        Method::PUT,
        "/api/notes/999999",
        Some(json!({ "title": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error, json!({ "error": "not found" }));
}

#[tokio::test]
async fn non_json_content_type_is_treated_as_empty_object() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/notes")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(json!({ "title": "ignored" }).to_string()))
        .expect("request");
    let (status, error) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({ "error": "title is required" }));

    let note = create(&app, json!({ "title": "kept", "content": "body" })).await;
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/notes/{}", note["id"]))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(json!({ "title": "renamed" }).to_string()))
        .expect("request");
    let (status, updated) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "kept");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_puts_all_succeed_and_last_writer_wins() {
    let (app, _dir) = app();
    let note = create(&app, json!({ "title": "start" })).await;
    let uri = format!("/api/notes/{}", note["id"]);

    let tasks: Vec<_> = (0..16)
        .map(|writer| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                let body = json!({
                    "title": format!("writer-{writer}"),
                    "content": format!("{writer}"),
                });
                send(&app, Method::PUT, &uri, Some(body)).await.0
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.expect("task"), StatusCode::OK);
    }

    let (status, stored) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let title = stored["title"].as_str().expect("title");
    let content = stored["content"].as_str().expect("content");
    assert_eq!(title, format!("writer-{content}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_all_succeed() {
    let (app, _dir) = app();
    let tasks: Vec<_> = (0..16)
        .map(|index| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = json!({ "title": format!("note {index}") });
                send(&app, Method::POST, "/api/notes", Some(body)).await.0
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.expect("task"), StatusCode::CREATED);
    }

    let (_, notes) = send(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(notes.as_array().expect("array").len(), 16);
}

#[tokio::test]
async fn non_integer_id_and_unknown_routes_are_404() {
    let (app, _dir) = app();
    for uri in ["/api/notes/abc", "/api/notes/1.5", "/api/unknown", "/nope"] {
        let (status, error) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(error, json!({ "error": "not found" }));
    }
}

#[tokio::test]
async fn api_routes_answer_cors_preflight() {
    let (app, _dir) = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/notes")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn restricted_origins_are_echoed_only_when_allowed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        database_url: format!("sqlite://{}", dir.path().join("notes.db").display()),
        allowed_origins: vec!["https://notes.example".to_string()],
        ..ServerConfig::default()
    };
    let app = build_app(&config).expect("app should build");

    for (origin, expected) in [
        ("https://notes.example", Some("https://notes.example")),
        ("https://evil.example", None),
    ] {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/notes")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            expected
        );
    }
}

#[test]
fn unreachable_database_aborts_startup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        database_url: format!(
            "sqlite://{}",
            dir.path().join("missing").join("notes.db").display()
        ),
        ..ServerConfig::default()
    };
    let err = build_app(&config).err().expect("startup must fail");
    assert!(err.to_string().contains("failed to connect to database"));
}
