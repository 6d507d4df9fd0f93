use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use diesel::connection::SimpleConnection;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use taskserver::core::config::AppConfig;
use taskserver::core::shared::state::AppState;
use taskserver::core::shared::utils::initialize;
use taskserver::main_module::build_router;

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AppConfig {
            database_url: format!("sqlite:///{}", dir.path().join("tasks.db").display()),
            db_pool_size: 2,
            ..AppConfig::default()
        };
        let pool = initialize(&config).expect("database");
        let state = Arc::new(AppState::new(pool, config));
        Self {
            router: build_router(Arc::clone(&state)),
            state,
            _dir: dir,
        }
    }

    fn execute_sql(&self, sql: &str) {
        let mut conn = self.state.conn.get().expect("pooled connection");
        conn.batch_execute(sql).expect("sql");
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create(&self, payload: Value) -> Value {
        let (status, body) = self.send(Method::POST, "/tasks", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| panic!("not a timestamp: {}", value))
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task Management API");
    assert!(body["endpoints"].as_array().unwrap().contains(&json!("/tasks")));

    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_returns_stored_task() {
    let app = TestApp::new();

    let task = app
        .create(json!({"title": "Buy milk", "status": "pending", "priority": "low"}))
        .await;

    assert!(task["id"].as_i64().unwrap() > 0);
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "low");
    timestamp(&task["created_at"]);
    assert!(task.get("updated_at").is_none());
}

#[tokio::test]
async fn test_create_trims_title_and_keeps_optional_fields() {
    let app = TestApp::new();
    let due = Utc::now() + Duration::days(2);

    let task = app
        .create(json!({
            "title": "  Write report  ",
            "description": "Q3 numbers",
            "due_date": due.to_rfc3339(),
            "assigned_to": "alex"
        }))
        .await;

    assert_eq!(task["title"], "Write report");
    assert_eq!(task["description"], "Q3 numbers");
    assert_eq!(task["assigned_to"], "alex");
    assert_eq!(task["status"], Value::Null);
    let stored_due = timestamp(&task["due_date"]);
    assert!((stored_due - due).num_milliseconds().abs() < 1);
}

#[tokio::test]
async fn test_create_accepts_due_date_without_offset() {
    let app = TestApp::new();

    let task = app
        .create(json!({"title": "Renew passport", "due_date": "2099-01-01T00:00:00"}))
        .await;
    assert_eq!(timestamp(&task["due_date"]).to_rfc3339(), "2099-01-01T00:00:00+00:00");

    let (status, body) = app
        .send(
            Method::POST,
            "/tasks",
            Some(json!({"title": "Too late", "due_date": "2000-01-01T00:00:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "due date must be in the future");
}

#[tokio::test]
async fn test_bad_query_and_path_values_return_json_errors() {
    let app = TestApp::new();

    for uri in ["/tasks?limit=abc", "/tasks?skip=-1", "/tasks/abc"] {
        let (status, body) = app.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}: {}", uri, body);
    }

    let (status, body) = app
        .send(Method::PUT, "/tasks/abc", Some(json!({"status": "done"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_storage_failure_hides_details() {
    let app = TestApp::new();
    app.create(json!({"title": "a"})).await;
    app.execute_sql("DROP TABLE tasks;");

    let (status, body) = app.send(Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let (status, body) = app.send(Method::POST, "/tasks", Some(json!({"title": "b"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = TestApp::new();
    let past = (Utc::now() - Duration::hours(1)).to_rfc3339();

    let cases = [
        (json!({"title": "   "}), "title cannot be empty"),
        (json!({"title": "Pay rent", "due_date": past}), "due date must be in the future"),
        (json!({"title": "Pay rent", "status": "blocked"}), "invalid enum value"),
        (json!({"title": "Pay rent", "priority": "urgent"}), "invalid enum value"),
    ];
    for (payload, message) in cases {
        let (status, body) = app.send(Method::POST, "/tasks", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }

    let (status, body) = app
        .send(Method::POST, "/tasks", Some(json!({"description": "no title"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));

    let (status, body) = app.send(Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_empty_store() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/tasks?skip=0&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_paginates_in_insertion_order() {
    let app = TestApp::new();
    let mut created = Vec::new();
    for i in 0..12 {
        let task = app.create(json!({"title": format!("task {}", i)})).await;
        created.push(task["id"].as_i64().unwrap());
    }

    let (_, body) = app.send(Method::GET, "/tasks", None).await;
    assert_eq!(ids(&body), created[..10].to_vec());

    let (_, body) = app.send(Method::GET, "/tasks?skip=10&limit=5", None).await;
    assert_eq!(ids(&body), created[10..].to_vec());
}

#[tokio::test]
async fn test_get_and_missing_task() {
    let app = TestApp::new();
    let task = app.create(json!({"title": "Call plumber"})).await;
    let id = task["id"].as_i64().unwrap();

    let (status, body) = app.send(Method::GET, &format!("/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, task);

    let (status, body) = app.send(Method::GET, "/tasks/999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

#[tokio::test]
async fn test_update_applies_partial_changes() {
    let app = TestApp::new();
    let task = app
        .create(json!({"title": "Buy milk", "status": "pending", "priority": "low"}))
        .await;
    let id = task["id"].as_i64().unwrap();

    let (status, updated) = app
        .send(Method::PUT, &format!("/tasks/{}", id), Some(json!({"status": "done"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], task["id"]);
    assert_eq!(updated["title"], "Buy milk");
    assert_eq!(updated["priority"], "low");
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["created_at"], task["created_at"]);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&updated["created_at"]));
}

#[tokio::test]
async fn test_update_null_clears_field() {
    let app = TestApp::new();
    let task = app
        .create(json!({"title": "Fix bike", "assigned_to": "sam", "priority": "high"}))
        .await;
    let id = task["id"].as_i64().unwrap();

    let (status, updated) = app
        .send(Method::PUT, &format!("/tasks/{}", id), Some(json!({"assigned_to": null})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["assigned_to"], Value::Null);
    assert_eq!(updated["priority"], "high");
}

#[tokio::test]
async fn test_update_validation_and_missing_task() {
    let app = TestApp::new();
    let task = app.create(json!({"title": "Fix bike"})).await;
    let uri = format!("/tasks/{}", task["id"]);

    let (status, body) = app.send(Method::PUT, &uri, Some(json!({"title": " \t "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title cannot be empty");

    let (status, _) = app
        .send(Method::PUT, &uri, Some(json!({"priority": "someday"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let past = (Utc::now() - Duration::days(1)).to_rfc3339();
    let (status, body) = app.send(Method::PUT, &uri, Some(json!({"due_date": past}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(timestamp(&body["due_date"]) < Utc::now());

    let (status, _) = app
        .send(Method::PUT, "/tasks/999999", Some(json!({"status": "done"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_task() {
    let app = TestApp::new();
    let task = app.create(json!({"title": "Old task"})).await;
    let uri = format!("/tasks/{}", task["id"]);

    let (status, body) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_by_status_and_priority() {
    let app = TestApp::new();
    app.create(json!({"title": "a", "status": "pending", "priority": "low"})).await;
    app.create(json!({"title": "b", "status": "done", "priority": "high"})).await;
    app.create(json!({"title": "c", "status": "pending", "priority": "high"})).await;

    let (status, body) = app.send(Method::GET, "/tasks/status/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app.send(Method::GET, "/tasks/priority/high", None).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["b", "c"]);

    let (status, body) = app.send(Method::GET, "/tasks/status/not-a-status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_bulk_create_is_all_or_nothing() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/tasks/bulk",
            Some(json!([{"title": "one"}, {"title": "two", "priority": "medium"}])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["priority"], "medium");

    let (status, body) = app
        .send(
            Method::POST,
            "/tasks/bulk",
            Some(json!([{"title": "three"}, {"title": ""}])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title cannot be empty");

    let (_, body) = app.send(Method::GET, "/tasks", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_update() {
    let app = TestApp::new();
    let a = app.create(json!({"title": "a", "status": "pending"})).await;
    let b = app.create(json!({"title": "b", "status": "pending"})).await;
    let untouched = app.create(json!({"title": "c", "status": "pending"})).await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/tasks/bulk/update",
            Some(json!({"ids": [a["id"], b["id"], 999999], "updates": {"status": "in-progress"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![a["id"].as_i64().unwrap(), b["id"].as_i64().unwrap()]);
    for task in body.as_array().unwrap() {
        assert_eq!(task["status"], "in-progress");
        assert!(task["updated_at"].is_string());
    }

    let (_, body) = app
        .send(Method::GET, &format!("/tasks/{}", untouched["id"]), None)
        .await;
    assert_eq!(body["status"], "pending");

    let (status, body) = app
        .send(
            Method::PUT,
            "/tasks/bulk/update",
            Some(json!({"ids": [999998, 999999], "updates": {"status": "done"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_bulk_update_rejects_invalid_fields() {
    let app = TestApp::new();
    let a = app.create(json!({"title": "a"})).await;

    for updates in [json!({"title": "  "}), json!({"status": "archived"}), json!({"id": 7})] {
        let (status, _) = app
            .send(
                Method::PUT,
                "/tasks/bulk/update",
                Some(json!({"ids": [a["id"]], "updates": updates})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, body) = app.send(Method::GET, &format!("/tasks/{}", a["id"]), None).await;
    assert_eq!(body["title"], "a");
    assert!(body.get("updated_at").is_none());
}

#[tokio::test]
async fn test_bulk_delete() {
    let app = TestApp::new();
    let a = app.create(json!({"title": "a"})).await;
    let b = app.create(json!({"title": "b"})).await;
    let kept = app.create(json!({"title": "kept"})).await;

    let (status, body) = app
        .send(
            Method::DELETE,
            "/tasks/bulk/delete",
            Some(json!({"ids": [999990, 999991]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = app
        .send(
            Method::DELETE,
            "/tasks/bulk/delete",
            Some(json!({"ids": [a["id"], b["id"], 999999]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert_eq!(body["message"], "Deleted 2 tasks");

    let (_, body) = app.send(Method::GET, "/tasks", None).await;
    assert_eq!(ids(&body), vec![kept["id"].as_i64().unwrap()]);
}
