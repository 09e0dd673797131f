/// Task operations
///
/// Creating and listing tasks inside a project goes through project RBAC
/// (`CreateTask`, `ViewTasks`). Reading, updating or deleting a single task
/// goes through creator ownership only: a project Owner or system admin who
/// did not create the task is refused.

use chrono::NaiveDate;
use uuid::Uuid;

use super::{required, ServiceError, ServiceResult};
use crate::auth::authorization::{authorize, require_task_owner, ProjectAction};
use crate::auth::middleware::AuthUser;
use crate::models::{NewTask, Task, TaskPriority, TaskStatus, UpdateTask};
use crate::store::{Store, StoreError};

/// Wire format for due dates
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` due date; blank means "no date"
pub fn parse_due_date(value: &str) -> ServiceResult<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| ServiceError::BadRequest("Invalid due_date format. Use YYYY-MM-DD".to_string()))
}

/// Task creation input; unset status and priority fall back to `todo` / `medium`
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
}

async fn require_assignee_member(
    store: &dyn Store,
    project_id: Uuid,
    assignee: Uuid,
) -> ServiceResult<()> {
    match store.get_membership(project_id, assignee).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound(_)) => Err(ServiceError::BadRequest(
            "Assignee must be a member of the project".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Creates a task in `project_id`; the caller becomes its owner
pub async fn create_task(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    draft: TaskDraft,
) -> ServiceResult<Task> {
    authorize(store, auth, project_id, ProjectAction::CreateTask).await?;
    store.get_project(project_id).await?;

    let title = required(&draft.title, "Title is required")?;

    if let Some(assignee) = draft.assigned_to {
        require_assignee_member(store, project_id, assignee).await?;
    }

    let task = store
        .create_task(NewTask {
            project_id,
            user_id: auth.user_id,
            title,
            description: draft.description,
            status: draft.status.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date,
            assigned_to: draft.assigned_to,
        })
        .await?;

    tracing::info!(task_id = %task.id, project_id = %project_id, user_id = %auth.user_id, "Task created");
    Ok(task)
}

/// Tasks the caller created, across all projects
pub async fn list_my_tasks(store: &dyn Store, auth: AuthUser) -> ServiceResult<Vec<Task>> {
    Ok(store.list_tasks_by_user(auth.user_id).await?)
}

/// All tasks in a project, for anyone with access to it
pub async fn list_project_tasks(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
) -> ServiceResult<Vec<Task>> {
    authorize(store, auth, project_id, ProjectAction::ViewTasks).await?;
    store.get_project(project_id).await?;
    Ok(store.list_tasks_by_project(project_id).await?)
}

pub async fn get_task(store: &dyn Store, auth: AuthUser, task_id: Uuid) -> ServiceResult<Task> {
    let task = store.get_task(task_id).await?;
    require_task_owner(auth, &task)?;
    Ok(task)
}

pub async fn update_task(
    store: &dyn Store,
    auth: AuthUser,
    task_id: Uuid,
    input: UpdateTask,
) -> ServiceResult<Task> {
    let task = store.get_task(task_id).await?;
    require_task_owner(auth, &task)?;

    let input = UpdateTask {
        title: input
            .title
            .as_deref()
            .map(|t| required(t, "Title is required"))
            .transpose()?,
        ..input
    };

    if let Some(Some(assignee)) = input.assigned_to {
        require_assignee_member(store, task.project_id, assignee).await?;
    }

    Ok(store.update_task(task_id, auth.user_id, input).await?)
}

pub async fn delete_task(store: &dyn Store, auth: AuthUser, task_id: Uuid) -> ServiceResult<()> {
    let task = store.get_task(task_id).await?;
    require_task_owner(auth, &task)?;
    store.delete_task(task_id, auth.user_id).await?;

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task deleted");
    Ok(())
}
