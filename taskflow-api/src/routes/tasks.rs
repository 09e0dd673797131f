/// Task endpoints
///
/// Creating and listing tasks inside a project is gated by project role.
/// Reading, updating and deleting a single task is allowed for its creator only.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};
use taskflow_shared::auth::middleware::AuthUser;
use taskflow_shared::models::{Task, TaskPriority, TaskStatus, UpdateTask};
use taskflow_shared::services::tasks::{self, parse_due_date, TaskDraft};
use uuid::Uuid;
use validator::Validate;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create task request
///
/// ```json
/// {
///   "title": "Write release notes",
///   "description": "",
///   "status": "todo",
///   "priority": "high",
///   "due_date": "2025-03-14",
///   "assigned_to": "uuid"
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    /// `YYYY-MM-DD`; blank means no due date
    pub due_date: Option<String>,

    pub assigned_to: Option<Uuid>,
}

/// Update task request
///
/// Omitted fields are left unchanged. `due_date` and `assigned_to` can be
/// cleared with an explicit `null`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

/// `GET /api/tasks`: tasks the caller created
pub async fn list_my_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = tasks::list_my_tasks(state.store.as_ref(), auth)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(tasks))
}

/// `GET /api/projects/:id/tasks`: any member may list
pub async fn list_project_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = tasks::list_project_tasks(state.store.as_ref(), auth, project_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(tasks))
}

/// `POST /api/projects/:id/tasks` (Owner, Manager or Member)
///
/// # Errors
///
/// - `400 Bad Request`: Blank title, bad `due_date`, or assignee outside the project
/// - `403 Forbidden`: Viewer or non-member
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    validate_request(&req)?;

    let due_date = match req.due_date.as_deref() {
        Some(value) => parse_due_date(value).map_err(|e| state.error(e))?,
        None => None,
    };

    let draft = TaskDraft {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
        due_date,
        assigned_to: req.assigned_to,
    };

    let task = tasks::create_task(state.store.as_ref(), auth, project_id, draft)
        .await
        .map_err(|e| state.error(e))?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = tasks::get_task(state.store.as_ref(), auth, task_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    validate_request(&req)?;

    let due_date = match req.due_date {
        Some(Some(value)) => Some(parse_due_date(&value).map_err(|e| state.error(e))?),
        Some(None) => Some(None),
        None => None,
    };

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        status: req.status,
        priority: req.priority,
        due_date,
        assigned_to: req.assigned_to,
    };

    let task = tasks::update_task(state.store.as_ref(), auth, task_id, update)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tasks::delete_task(state.store.as_ref(), auth, task_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(StatusCode::NO_CONTENT)
}
