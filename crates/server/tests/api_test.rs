//! Router-level tests: requests go through the full middleware stack with `oneshot`
//! against a migrated temporary database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use db::{DBService, test_utils::create_test_pool};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, routes};
use services::services::{config::Config, storage::AttachmentStore};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    _db_dir: TempDir,
    _storage_dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let (pool, db_dir) = create_test_pool().await;
        let storage_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.jwt_secret = "integration-secret".to_string();

        let attachments = AttachmentStore::new(storage_dir.path(), "http://localhost:3000");
        let state = AppState::new(DBService::from_pool(pool), config, attachments);
        Self {
            router: routes::router(state.clone()),
            state,
            _db_dir: db_dir,
            _storage_dir: storage_dir,
        }
    }

    fn token(&self, user_id: &str) -> String {
        self.state
            .jwt
            .issue(user_id, None, Duration::minutes(10))
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, user_id: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user_id)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post(&self, user_id: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json_request("POST", user_id, uri, body).await
    }

    async fn json_request(
        &self,
        method: &str,
        user_id: &str,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user_id)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Create a board and return `(board_id, column ids in order)`.
    async fn create_board(&self, user_id: &str, title: &str) -> (String, Vec<String>) {
        let (status, body) = self
            .post(user_id, "/api/boards", json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let board_id = body["data"]["id"].as_str().unwrap().to_string();
        let columns = body["data"]["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect();
        (board_id, columns)
    }

    async fn create_task(&self, user_id: &str, column_id: &str, body: Value) -> Value {
        let mut body = body;
        body["column_id"] = json!(column_id);
        let (status, response) = self.post(user_id, "/api/tasks", body).await;
        assert_eq!(status, StatusCode::OK, "{response}");
        response["data"].clone()
    }
}

fn task_titles(column: &Value) -> Vec<&str> {
    column["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database_ready"], true);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/boards")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Authentication error:")
    );
}

#[tokio::test]
async fn new_boards_get_default_columns() {
    let app = TestApp::new().await;
    let (board_id, columns) = app.create_board("user_a", "Launch").await;
    assert_eq!(columns.len(), 4);

    let (status, body) = app.get("user_a", &format!("/api/boards/{board_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["data"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["To Do", "In Progress", "Review", "Done"]);

    let (_, listed) = app.get("user_a", "/api/boards").await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_board_titles_get_a_friendly_message() {
    let app = TestApp::new().await;
    app.create_board("user_a", "Roadmap").await;

    let (status, body) = app
        .post("user_a", "/api/boards", json!({ "title": "Roadmap" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A board with this title already exists.");

    // Titles are unique per owner only.
    app.create_board("user_b", "Roadmap").await;
}

#[tokio::test]
async fn boards_of_other_users_are_not_found() {
    let app = TestApp::new().await;
    let (board_id, _) = app.create_board("user_a", "Private").await;

    let (status, _) = app.get("user_b", &format!("/api/boards/{board_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn board_fetch_filters_tasks_by_priority() {
    let app = TestApp::new().await;
    let (board_id, columns) = app.create_board("user_a", "Filtered").await;
    app.create_task("user_a", &columns[0], json!({ "title": "T1", "priority": "high" }))
        .await;
    app.create_task("user_a", &columns[0], json!({ "title": "T2", "priority": "low" }))
        .await;

    let (status, body) = app
        .get("user_a", &format!("/api/boards/{board_id}?priority=high"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let columns = body["data"]["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(task_titles(&columns[0]), ["T1"]);

    let (status, _) = app
        .get("user_a", &format!("/api/boards/{board_id}?priority=urgent"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn moving_a_task_renumbers_both_columns() {
    let app = TestApp::new().await;
    let (board_id, columns) = app.create_board("user_a", "Moves").await;
    let t1 = app
        .create_task("user_a", &columns[0], json!({ "title": "T1" }))
        .await;
    app.create_task("user_a", &columns[1], json!({ "title": "T3" }))
        .await;

    let task_id = t1["id"].as_str().unwrap();
    let (status, body) = app
        .post(
            "user_a",
            &format!("/api/tasks/{task_id}/move"),
            json!({ "column_id": columns[1], "sort_order": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["sort_order"], 1);

    let (_, board) = app.get("user_a", &format!("/api/boards/{board_id}")).await;
    let board_columns = board["data"]["columns"].as_array().unwrap();
    assert!(task_titles(&board_columns[0]).is_empty());
    assert_eq!(task_titles(&board_columns[1]), ["T3", "T1"]);

    let (_, activities) = app
        .get("user_a", &format!("/api/boards/{board_id}/activities"))
        .await;
    assert_eq!(activities["data"][0]["action"], "moved");
}

#[tokio::test]
async fn tasks_cannot_move_to_another_board() {
    let app = TestApp::new().await;
    let (_, first) = app.create_board("user_a", "First").await;
    let (_, second) = app.create_board("user_a", "Second").await;
    let task = app
        .create_task("user_a", &first[0], json!({ "title": "Stay" }))
        .await;

    let (status, _) = app
        .post(
            "user_a",
            &format!("/api/tasks/{}/move", task["id"].as_str().unwrap()),
            json!({ "column_id": second[0], "sort_order": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_timer_is_rejected() {
    let app = TestApp::new().await;
    let (_, columns) = app.create_board("user_a", "Timers").await;
    let first = app
        .create_task("user_a", &columns[0], json!({ "title": "A" }))
        .await;
    let second = app
        .create_task("user_a", &columns[0], json!({ "title": "B" }))
        .await;

    let (status, _) = app
        .post(
            "user_a",
            &format!("/api/tasks/{}/time-entries/start", first["id"].as_str().unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "user_a",
            &format!("/api/tasks/{}/time-entries/start", second["id"].as_str().unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A timer is already running");
}

#[tokio::test]
async fn timers_on_boards_the_caller_lost_are_not_found() {
    let app = TestApp::new().await;
    let (board_id, columns) = app.create_board("user_a", "Handover").await;
    let task = app
        .create_task("user_a", &columns[0], json!({ "title": "Audit" }))
        .await;

    let (status, body) = app
        .post(
            "user_a",
            &format!("/api/tasks/{}/time-entries/start", task["id"].as_str().unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entry_id = body["data"]["id"].as_str().unwrap().to_string();

    sqlx::query("UPDATE boards SET user_id = 'user_b' WHERE id = $1")
        .bind(uuid::Uuid::parse_str(&board_id).unwrap())
        .execute(app.state.pool())
        .await
        .unwrap();

    let (status, body) = app
        .post("user_a", &format!("/api/time-entries/{entry_id}/stop"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Time entry not found");

    let (status, _) = app
        .json_request("DELETE", "user_a", &format!("/api/time-entries/{entry_id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_feature_tables_answer_service_unavailable() {
    let app = TestApp::new().await;
    let (_, columns) = app.create_board("user_a", "Legacy").await;
    let task = app
        .create_task("user_a", &columns[0], json!({ "title": "Old schema" }))
        .await;

    sqlx::query("DROP TABLE comments")
        .execute(app.state.pool())
        .await
        .unwrap();

    let (status, body) = app
        .get(
            "user_a",
            &format!("/api/tasks/{}/comments", task["id"].as_str().unwrap()),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Comments feature requires database migration");
}

#[tokio::test]
async fn deleting_a_task_removes_its_attachments() {
    let app = TestApp::new().await;
    let (board_id, columns) = app.create_board("user_a", "Files").await;
    let kept = app
        .create_task("user_a", &columns[0], json!({ "title": "Keep" }))
        .await;
    let dropped = app
        .create_task("user_a", &columns[0], json!({ "title": "Drop" }))
        .await;
    let kept_id = uuid::Uuid::parse_str(kept["id"].as_str().unwrap()).unwrap();
    let dropped_id = uuid::Uuid::parse_str(dropped["id"].as_str().unwrap()).unwrap();

    let store = &app.state.attachments;
    store.upload(kept_id, "brief.pdf", None, b"%PDF").await.unwrap();
    store.upload(dropped_id, "notes.txt", None, b"notes").await.unwrap();

    let (status, _) = app
        .json_request("DELETE", "user_a", &format!("/api/tasks/{dropped_id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!store.bucket_dir().join(dropped_id.to_string()).exists());
    assert_eq!(store.list(kept_id).await.unwrap().len(), 1);

    let (status, _) = app
        .json_request("DELETE", "user_a", &format!("/api/boards/{board_id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!store.bucket_dir().join(kept_id.to_string()).exists());
}

#[tokio::test]
async fn invalid_relation_types_are_rejected() {
    let app = TestApp::new().await;
    let (_, columns) = app.create_board("user_a", "Relations").await;
    let a = app
        .create_task("user_a", &columns[0], json!({ "title": "A" }))
        .await;
    let b = app
        .create_task("user_a", &columns[0], json!({ "title": "B" }))
        .await;
    let a_id = a["id"].as_str().unwrap();

    let (status, _) = app
        .post(
            "user_a",
            &format!("/api/tasks/{a_id}/relations"),
            json!({ "related_task_id": b["id"], "relation_type": "depends_on" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "user_a",
            &format!("/api/tasks/{a_id}/relations"),
            json!({ "related_task_id": b["id"], "relation_type": "blocks" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn demo_actions_can_be_undone() {
    let app = TestApp::new().await;
    let (status, state) = app.get("user_a", "/api/demo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["data"]["can_undo"], false);

    let current_board = state["data"]["current_board"].as_str().unwrap().to_string();
    let board = state["data"]["boards"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == current_board.as_str())
        .unwrap()
        .clone();
    let column = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["limit"].is_null())
        .unwrap_or(&board["columns"][0])
        .clone();
    let column_id = column["id"].as_str().unwrap();
    let before = column["tasks"].as_array().unwrap().len();

    let (status, body) = app
        .post(
            "user_a",
            "/api/demo/actions",
            json!({
                "type": "add_task",
                "payload": { "column_id": column_id, "task": { "title": "Write docs" } }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["can_undo"], true);

    let (_, undone) = app
        .post("user_a", "/api/demo/actions", json!({ "type": "undo" }))
        .await;
    assert_eq!(undone["data"]["can_undo"], false);
    assert_eq!(undone["data"]["can_redo"], true);
    let restored = undone["data"]["boards"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|b| b["columns"].as_array().unwrap().iter())
        .find(|c| c["id"] == column_id)
        .unwrap();
    assert_eq!(restored["tasks"].as_array().unwrap().len(), before);
}
