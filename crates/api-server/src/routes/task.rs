//! Task API endpoints
//!
//! RESTful API for task CRUD operations.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tm_core::task::{TaskItem, TaskPriority, TaskRepository, TaskStatus};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request body accepted by POST and PUT
///
/// PUT replaces the whole resource: optional fields left out of the body
/// fall back to their defaults rather than keeping the stored values.
/// Completion state is derived from `status`, so clients never send
/// `isCompleted` or `completedAt`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assigned_user_id: Option<i64>,
}

impl TaskRequest {
    fn into_task(self) -> TaskItem {
        let mut task = TaskItem::new(self.title);

        if let Some(description) = self.description {
            task = task.with_description(description);
        }
        if let Some(due_date) = self.due_date {
            task = task.with_due_date(due_date);
        }
        if let Some(priority) = self.priority {
            task = task.with_priority(priority);
        }
        if let Some(status) = self.status {
            task = task.with_status(status);
        }
        if let Some(user_id) = self.assigned_user_id {
            task = task.with_assigned_user(user_id);
        }

        task
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub due_date: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_user_id: Option<i64>,
}

impl From<TaskItem> for TaskResponse {
    fn from(task: TaskItem) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            created_at: task.created_at.to_rfc3339(),
            completed_at: task.completed_at.map(|t| t.to_rfc3339()),
            due_date: task.due_date.map(|t| t.to_rfc3339()),
            priority: task.priority,
            status: task.status,
            assigned_user_id: task.assigned_user_id,
        }
    }
}

// Malformed bodies (bad JSON, wrong types, out-of-range enum codes) are a
// client error, not the framework default 422.
fn reject_body(rejection: JsonRejection) -> ApiError {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    ApiError::bad_request(rejection.body_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - List all tasks
async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.task_store().list().await?;
    tracing::info!("Listed {} tasks", tasks.len());

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// GET /tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    match state.task_store().get(id).await? {
        Some(task) => {
            tracing::info!("Fetched task {id}");
            Ok(Json(TaskResponse::from(task)))
        }
        None => {
            tracing::warn!("Task {id} not found");
            Err(ApiError::not_found(format!("Task {id} not found")))
        }
    }
}

/// POST /tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(req) = payload.map_err(reject_body)?;

    if req.title.trim().is_empty() {
        tracing::warn!("Rejected task creation: empty title");
        return Err(ApiError::bad_request("Title cannot be empty"));
    }

    let created = state.task_store().create(req.into_task()).await?;
    tracing::info!("Created task {}", created.id);

    Ok((StatusCode::CREATED, Json(TaskResponse::from(created))))
}

/// PUT /tasks/{id} - Replace a task
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Json(req) = payload.map_err(reject_body)?;

    if req.title.trim().is_empty() {
        tracing::warn!("Rejected update of task {id}: empty title");
        return Err(ApiError::bad_request("Title cannot be empty"));
    }

    let updated = state.task_store().update(id, req.into_task()).await?;
    tracing::info!("Updated task {id}");

    Ok(Json(TaskResponse::from(updated)))
}

/// DELETE /tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.task_store().delete(id).await?;

    if deleted {
        tracing::info!("Deleted task {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::warn!("Task {id} not found");
        Err(ApiError::not_found(format!("Task {id} not found")))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use tm_core::task::SqliteTaskStore;

    use crate::state::AppState;

    async fn build_app() -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteTaskStore::new(temp_dir.path().join("tasks.db"))
            .await
            .unwrap();
        let app = super::router().with_state(AppState::with_store(store));
        (app, temp_dir)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_task_applies_defaults() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(json_request("POST", "/tasks", json!({"title": "Buy milk"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["title"], "Buy milk");
        assert_eq!(body["status"], 1);
        assert_eq!(body["priority"], 2);
        assert_eq!(body["isCompleted"], false);
        assert!(body["description"].is_null());
        assert!(body["completedAt"].is_null());
        assert!(!body["createdAt"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_task_rejects_empty_title() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(json_request("POST", "/tasks", json!({"title": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Title"));
    }

    #[tokio::test]
    async fn create_task_rejects_overlong_title() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/tasks",
                json!({"title": "x".repeat(201)}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_task_rejects_invalid_enum_code() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/tasks",
                json!({"title": "Buy milk", "priority": 9}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_tasks_returns_all() {
        let (app, _temp) = build_app().await;

        for title in ["One", "Two", "Three"] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/tasks", json!({"title": title})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app.oneshot(empty_request("GET", "/tasks")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["title"], "One");
    }

    #[tokio::test]
    async fn get_missing_task_returns_404() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(empty_request("GET", "/tasks/999"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Task 999 not found");
    }

    #[tokio::test]
    async fn put_replaces_whole_resource() {
        let (app, _temp) = build_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/tasks",
                json!({
                    "title": "Original",
                    "description": "Keep me?",
                    "priority": 3,
                    "assignedUserId": 5
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = read_json(response).await;

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/tasks/1", json!({"title": "Replaced"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["title"], "Replaced");
        assert!(body["description"].is_null());
        assert_eq!(body["priority"], 2);
        assert!(body["assignedUserId"].is_null());
        assert_eq!(body["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn put_empty_title_leaves_task_unchanged() {
        let (app, _temp) = build_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/tasks", json!({"title": "Keep me"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/tasks/1", json!({"title": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(empty_request("GET", "/tasks/1"))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["title"], "Keep me");
    }

    #[tokio::test]
    async fn put_missing_task_returns_404() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(json_request("PUT", "/tasks/999", json!({"title": "Ghost"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_completion_transition_sets_and_clears_stamp() {
        let (app, _temp) = build_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/tasks", json!({"title": "Finish me"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/tasks/1",
                json!({"title": "Finish me", "status": 4}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["isCompleted"], true);
        assert!(!body["completedAt"].is_null());

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/tasks/1",
                json!({"title": "Finish me", "status": 2}),
            ))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["isCompleted"], false);
        assert!(body["completedAt"].is_null());
    }

    #[tokio::test]
    async fn delete_then_get_returns_404() {
        let (app, _temp) = build_app().await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/tasks", json!({"title": "Short lived"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", "/tasks/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("GET", "/tasks/1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_missing_task_returns_404() {
        let (app, _temp) = build_app().await;

        let response = app
            .oneshot(empty_request("DELETE", "/tasks/999"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
