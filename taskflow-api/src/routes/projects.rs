/// Project and membership endpoints
///
/// All endpoints require authentication. Role requirements are enforced by
/// `taskflow_shared::services::projects`; a caller without the required role
/// receives `403` with a message naming the roles that would be allowed.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskflow_shared::auth::middleware::AuthUser;
use taskflow_shared::models::{CreateProject, Project, ProjectMember, ProjectRole, UpdateProject};
use taskflow_shared::services::projects;
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// Update project request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Invite request; `role` defaults to `Member`
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

/// `GET /api/projects`: the caller's projects, or every project for an admin
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = projects::list_projects(state.store.as_ref(), auth)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(projects))
}

/// `POST /api/projects`: creates a project with the caller as Owner
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    validate_request(&req)?;

    let project = projects::create_project(
        state.store.as_ref(),
        auth,
        CreateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await
    .map_err(|e| state.error(e))?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = projects::get_project(state.store.as_ref(), auth, project_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(project))
}

/// `PUT /api/projects/:id` (Owner or Manager)
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    validate_request(&req)?;

    let project = projects::update_project(
        state.store.as_ref(),
        auth,
        project_id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await
    .map_err(|e| state.error(e))?;

    Ok(Json(project))
}

/// `DELETE /api/projects/:id` (Owner only); tasks and memberships go with it
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    projects::delete_project(state.store.as_ref(), auth, project_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    let members = projects::list_members(state.store.as_ref(), auth, project_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(members))
}

/// `POST /api/projects/:id/invite` (Owner or Manager)
///
/// ```json
/// { "email": "colleague@example.com", "role": "PM" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Role is not PM, Member or Viewer
/// - `404 Not Found`: No account with that email
/// - `409 Conflict`: Already a member
pub async fn invite_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMember>)> {
    validate_request(&req)?;
    let role = req.role.as_deref().unwrap_or(ProjectRole::Member.as_str());

    let member = projects::invite_member(state.store.as_ref(), auth, project_id, &req.email, role)
        .await
        .map_err(|e| state.error(e))?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// `PUT /api/projects/:id/members/:user_id` (Owner only)
pub async fn update_member_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMemberRoleRequest>,
) -> ApiResult<Json<ProjectMember>> {
    let member =
        projects::update_member_role(state.store.as_ref(), auth, project_id, user_id, &req.role)
            .await
            .map_err(|e| state.error(e))?;

    Ok(Json(member))
}

/// `DELETE /api/projects/:id/members/:user_id` (Owner or Manager)
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    projects::remove_member(state.store.as_ref(), auth, project_id, user_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(StatusCode::NO_CONTENT)
}
