/// Projects and the membership lifecycle
///
/// # Lifecycle
///
/// - **Created**: the creator becomes Owner atomically with the project row, or an
///   existing user is invited as Manager, Member or Viewer
/// - **Mutated**: Owner-only role change between the assignable roles
/// - **Removed**: Owner/Manager-initiated removal, or the cascade when the user
///   account is deleted (see [`super::admin::delete_user`])
///
/// The Owner membership can be neither re-assigned nor removed through these
/// operations, so every project keeps exactly one Owner.
///
/// Authorization runs before any existence check, so non-members learn nothing
/// about projects they cannot see.

use uuid::Uuid;

use super::{required, ServiceError, ServiceResult};
use crate::auth::authorization::{authorize, is_system_admin, ProjectAction};
use crate::auth::middleware::AuthUser;
use crate::models::{CreateProject, Project, ProjectMember, ProjectRole, UpdateProject};
use crate::store::{Store, StoreError};

pub const INVALID_ROLE: &str = "Invalid role. Must be PM, Member, or Viewer";

/// Parses a role label, accepting only roles that can be granted
fn assignable_role(label: &str) -> ServiceResult<ProjectRole> {
    label
        .trim()
        .parse::<ProjectRole>()
        .ok()
        .filter(ProjectRole::is_assignable)
        .ok_or_else(|| ServiceError::BadRequest(INVALID_ROLE.to_string()))
}

/// Creates a project owned by the caller
pub async fn create_project(
    store: &dyn Store,
    auth: AuthUser,
    input: CreateProject,
) -> ServiceResult<Project> {
    let input = CreateProject {
        name: required(&input.name, "Project name is required")?,
        description: input.description.trim().to_string(),
    };

    let project = store.create_project_with_owner(input, auth.user_id).await?;

    tracing::info!(
        project_id = %project.id,
        owner_id = %auth.user_id,
        "Project created"
    );
    Ok(project)
}

/// Every project for a system admin, otherwise the caller's projects
pub async fn list_projects(store: &dyn Store, auth: AuthUser) -> ServiceResult<Vec<Project>> {
    if is_system_admin(store, auth.user_id).await? {
        return Ok(store.list_projects().await?);
    }
    Ok(store.list_projects_for_user(auth.user_id).await?)
}

pub async fn get_project(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
) -> ServiceResult<Project> {
    authorize(store, auth, project_id, ProjectAction::ViewProject).await?;
    Ok(store.get_project(project_id).await?)
}

pub async fn update_project(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    input: UpdateProject,
) -> ServiceResult<Project> {
    authorize(store, auth, project_id, ProjectAction::UpdateProject).await?;

    let input = UpdateProject {
        name: input
            .name
            .as_deref()
            .map(|name| required(name, "Project name is required"))
            .transpose()?,
        description: input.description.map(|d| d.trim().to_string()),
    };

    Ok(store.update_project(project_id, input).await?)
}

pub async fn delete_project(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
) -> ServiceResult<()> {
    authorize(store, auth, project_id, ProjectAction::DeleteProject).await?;
    store.delete_project(project_id).await?;

    tracing::info!(project_id = %project_id, deleted_by = %auth.user_id, "Project deleted");
    Ok(())
}

pub async fn list_members(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
) -> ServiceResult<Vec<ProjectMember>> {
    authorize(store, auth, project_id, ProjectAction::ListMembers).await?;
    store.get_project(project_id).await?;
    Ok(store.list_members(project_id).await?)
}

/// Adds an existing user to the project
///
/// # Errors
///
/// - `Forbidden` unless the caller is Owner, Manager or a system admin
/// - `NotFound` if no account has `email` (no placeholder is created)
/// - `BadRequest` if `role` is not a PM, Member or Viewer label
/// - `Conflict` if the user already has a membership, whatever its role
pub async fn invite_member(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    email: &str,
    role: &str,
) -> ServiceResult<ProjectMember> {
    authorize(store, auth, project_id, ProjectAction::InviteMember).await?;
    store.get_project(project_id).await?;

    let invitee = store
        .get_user_by_email(&super::session::normalize_email(email))
        .await?;

    let role = assignable_role(role)?;

    match store.get_membership(project_id, invitee.id).await {
        Ok(_) => {
            return Err(ServiceError::Conflict(
                "User is already a member of this project".to_string(),
            ))
        }
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    store.upsert_membership(project_id, invitee.id, role).await?;

    tracing::info!(
        project_id = %project_id,
        user_id = %invitee.id,
        role = %role,
        invited_by = %auth.user_id,
        "Member invited"
    );

    find_member(store, project_id, invitee.id).await
}

/// Changes a member's role
///
/// # Errors
///
/// - `Forbidden` unless the caller is Owner or a system admin, or if the target is the Owner
/// - `BadRequest` if `role` is not a PM, Member or Viewer label
/// - `NotFound` if the target has no membership
pub async fn update_member_role(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    user_id: Uuid,
    role: &str,
) -> ServiceResult<ProjectMember> {
    authorize(store, auth, project_id, ProjectAction::UpdateMemberRole).await?;
    let role = assignable_role(role)?;

    if store.get_membership(project_id, user_id).await? == ProjectRole::Owner {
        return Err(ServiceError::Forbidden(
            "Cannot change the project owner's role".to_string(),
        ));
    }

    if !store
        .update_membership_role(project_id, user_id, role)
        .await?
    {
        return Err(ServiceError::NotFound("Member not found".to_string()));
    }

    tracing::info!(
        project_id = %project_id,
        user_id = %user_id,
        role = %role,
        changed_by = %auth.user_id,
        "Member role updated"
    );

    find_member(store, project_id, user_id).await
}

/// Removes a member from the project
///
/// # Errors
///
/// - `Forbidden` unless the caller is Owner, Manager or a system admin, or if the target is the Owner
/// - `NotFound` if the target has no membership
pub async fn remove_member(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<()> {
    authorize(store, auth, project_id, ProjectAction::RemoveMember).await?;

    if store.get_membership(project_id, user_id).await? == ProjectRole::Owner {
        return Err(ServiceError::Forbidden(
            "Cannot remove the project owner".to_string(),
        ));
    }

    if !store.delete_membership(project_id, user_id).await? {
        return Err(ServiceError::NotFound("Member not found".to_string()));
    }

    tracing::info!(
        project_id = %project_id,
        user_id = %user_id,
        removed_by = %auth.user_id,
        "Member removed"
    );
    Ok(())
}

async fn find_member(
    store: &dyn Store,
    project_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<ProjectMember> {
    store
        .list_members(project_id)
        .await?
        .into_iter()
        .find(|m| m.user_id == user_id)
        .ok_or_else(|| ServiceError::NotFound("Member not found".to_string()))
}
