/// Authorization engine
///
/// Two independent systems decide what an authenticated caller may do:
///
/// - **Project RBAC**: membership roles gate project-level actions via [`authorize`].
///   A system admin short-circuits every project check.
/// - **Task ownership**: reading or mutating a task by id requires being its creator
///   ([`require_task_owner`]). Project role and the system-admin flag play no part,
///   so a project Owner cannot edit another member's task through RBAC.
///
/// # Policy
///
/// | Action | Allowed roles |
/// |---|---|
/// | View project, list members, view tasks | any membership |
/// | Update project | Owner, Manager |
/// | Delete project | Owner |
/// | Invite member | Owner, Manager |
/// | Update member role | Owner |
/// | Remove member | Owner, Manager |
/// | Create task | Owner, Manager, Member |
///
/// # Failure Mode
///
/// A missing user or membership evaluates to "not allowed". Any other store failure
/// propagates as [`AuthzError::Store`], so checks never fail open.
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::auth::authorization::{authorize, ProjectAction};
/// use taskflow_shared::auth::middleware::AuthUser;
/// use taskflow_shared::store::Store;
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn Store, auth: AuthUser, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// authorize(store, auth, project_id, ProjectAction::InviteMember).await?;
/// // caller is Owner, Manager or a system admin
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use super::middleware::AuthUser;
use crate::models::{ProjectRole, Task};
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Authenticated but not allowed; the message names the required role
    #[error("{0}")]
    Forbidden(String),

    /// Store failed while evaluating the check
    #[error(transparent)]
    Store(#[from] StoreError),
}

const OWNER_ONLY: &[ProjectRole] = &[ProjectRole::Owner];
const OWNER_OR_MANAGER: &[ProjectRole] = &[ProjectRole::Owner, ProjectRole::Manager];
const CONTRIBUTORS: &[ProjectRole] = &[ProjectRole::Owner, ProjectRole::Manager, ProjectRole::Member];

/// Project-level actions subject to RBAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    ViewProject,
    ListMembers,
    UpdateProject,
    DeleteProject,
    InviteMember,
    UpdateMemberRole,
    RemoveMember,
    ViewTasks,
    CreateTask,
}

impl ProjectAction {
    /// Roles allowed to perform the action; `None` means any membership
    pub fn required_roles(&self) -> Option<&'static [ProjectRole]> {
        match self {
            ProjectAction::ViewProject | ProjectAction::ListMembers | ProjectAction::ViewTasks => {
                None
            }
            ProjectAction::UpdateProject
            | ProjectAction::InviteMember
            | ProjectAction::RemoveMember => Some(OWNER_OR_MANAGER),
            ProjectAction::DeleteProject | ProjectAction::UpdateMemberRole => Some(OWNER_ONLY),
            ProjectAction::CreateTask => Some(CONTRIBUTORS),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            ProjectAction::ViewProject => "view project",
            ProjectAction::ListMembers => "list members",
            ProjectAction::UpdateProject => "update project",
            ProjectAction::DeleteProject => "delete project",
            ProjectAction::InviteMember => "invite members",
            ProjectAction::UpdateMemberRole => "update member roles",
            ProjectAction::RemoveMember => "remove members",
            ProjectAction::ViewTasks => "view tasks",
            ProjectAction::CreateTask => "create tasks",
        }
    }

    /// Denial message naming the roles that would have been allowed
    pub fn denial_message(&self) -> String {
        match self.required_roles() {
            None => "Access denied".to_string(),
            Some(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.display_name()).collect();
                let who = match names.as_slice() {
                    [only] => (*only).to_string(),
                    [first, second] => format!("{first} or {second}"),
                    [init @ .., last] => format!("{}, or {last}", init.join(", ")),
                    [] => "nobody".to_string(),
                };
                format!("Only {who} can {}", self.verb())
            }
        }
    }
}

/// True if `user_id` exists and holds the system-wide admin role
pub async fn is_system_admin(store: &dyn Store, user_id: Uuid) -> Result<bool, AuthzError> {
    match store.get_user_by_id(user_id).await {
        Ok(user) => Ok(user.is_admin()),
        Err(StoreError::NotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn membership_role(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Option<ProjectRole>, AuthzError> {
    match store.get_membership(project_id, user_id).await {
        Ok(role) => Ok(Some(role)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// True for a system admin or any member of the project
pub async fn has_access(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<bool, AuthzError> {
    if is_system_admin(store, user_id).await? {
        return Ok(true);
    }

    Ok(membership_role(store, user_id, project_id).await?.is_some())
}

/// True for a system admin or a member whose role is in `allowed`
pub async fn has_role(
    store: &dyn Store,
    user_id: Uuid,
    project_id: Uuid,
    allowed: &[ProjectRole],
) -> Result<bool, AuthzError> {
    if is_system_admin(store, user_id).await? {
        return Ok(true);
    }

    Ok(membership_role(store, user_id, project_id)
        .await?
        .is_some_and(|role| allowed.contains(&role)))
}

/// Checks the policy table for `action` on `project_id`
///
/// # Errors
///
/// - `AuthzError::Forbidden` with a role hint if the caller is not allowed
/// - `AuthzError::Store` if the check itself could not be evaluated
pub async fn authorize(
    store: &dyn Store,
    auth: AuthUser,
    project_id: Uuid,
    action: ProjectAction,
) -> Result<(), AuthzError> {
    let allowed = match action.required_roles() {
        None => has_access(store, auth.user_id, project_id).await?,
        Some(roles) => has_role(store, auth.user_id, project_id, roles).await?,
    };

    if !allowed {
        tracing::warn!(
            user_id = %auth.user_id,
            project_id = %project_id,
            action = ?action,
            "Project access denied"
        );
        return Err(AuthzError::Forbidden(action.denial_message()));
    }

    Ok(())
}

/// Ownership check for task reads and writes by id
///
/// Deliberately ignores project role and system-admin status.
pub fn require_task_owner(auth: AuthUser, task: &Task) -> Result<(), AuthzError> {
    if auth.user_id != task.user_id {
        tracing::warn!(
            user_id = %auth.user_id,
            task_id = %task.id,
            owner_id = %task.user_id,
            "Task access denied: not the creator"
        );
        return Err(AuthzError::Forbidden("Access denied".to_string()));
    }

    Ok(())
}

/// Gate for the admin endpoints
pub async fn require_system_admin(store: &dyn Store, auth: AuthUser) -> Result<(), AuthzError> {
    if !is_system_admin(store, auth.user_id).await? {
        tracing::warn!(user_id = %auth.user_id, "Admin access denied");
        return Err(AuthzError::Forbidden("Admin access required".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProject, CreateUser, SystemRole, TaskPriority, TaskStatus};
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[test]
    fn test_policy_table() {
        use ProjectRole::*;

        assert_eq!(ProjectAction::ViewProject.required_roles(), None);
        assert_eq!(ProjectAction::ListMembers.required_roles(), None);
        assert_eq!(ProjectAction::ViewTasks.required_roles(), None);
        assert_eq!(
            ProjectAction::UpdateProject.required_roles(),
            Some(&[Owner, Manager][..])
        );
        assert_eq!(ProjectAction::DeleteProject.required_roles(), Some(&[Owner][..]));
        assert_eq!(
            ProjectAction::InviteMember.required_roles(),
            Some(&[Owner, Manager][..])
        );
        assert_eq!(ProjectAction::UpdateMemberRole.required_roles(), Some(&[Owner][..]));
        assert_eq!(
            ProjectAction::RemoveMember.required_roles(),
            Some(&[Owner, Manager][..])
        );
        assert_eq!(
            ProjectAction::CreateTask.required_roles(),
            Some(&[Owner, Manager, Member][..])
        );
    }

    #[test]
    fn test_denial_messages() {
        assert_eq!(
            ProjectAction::UpdateProject.denial_message(),
            "Only Owner or Manager can update project"
        );
        assert_eq!(
            ProjectAction::DeleteProject.denial_message(),
            "Only Owner can delete project"
        );
        assert_eq!(
            ProjectAction::CreateTask.denial_message(),
            "Only Owner, Manager, or Member can create tasks"
        );
        assert_eq!(ProjectAction::ViewProject.denial_message(), "Access denied");
    }

    async fn user(store: &MemoryStore, email: &str, system_role: SystemRole) -> Uuid {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                name: email.to_string(),
                system_role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_viewer_has_access_but_not_manager_role() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com", SystemRole::User).await;
        let viewer = user(&store, "viewer@example.com", SystemRole::User).await;
        let project = store
            .create_project_with_owner(
                CreateProject {
                    name: "p".to_string(),
                    description: String::new(),
                },
                owner,
            )
            .await
            .unwrap();
        store
            .upsert_membership(project.id, viewer, ProjectRole::Viewer)
            .await
            .unwrap();

        assert!(has_access(&store, viewer, project.id).await.unwrap());
        assert!(!has_role(
            &store,
            viewer,
            project.id,
            &[ProjectRole::Owner, ProjectRole::Manager]
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn test_admin_passes_without_membership() {
        let store = MemoryStore::new();
        let admin = user(&store, "admin@example.com", SystemRole::Admin).await;
        let nowhere = Uuid::new_v4();

        assert!(has_access(&store, admin, nowhere).await.unwrap());
        assert!(has_role(&store, admin, nowhere, &[]).await.unwrap());
        assert!(
            authorize(&store, AuthUser::new(admin), nowhere, ProjectAction::DeleteProject)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_unknown_user_is_denied() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();

        assert!(!has_access(&store, ghost, Uuid::new_v4()).await.unwrap());
        let err = authorize(&store, AuthUser::new(ghost), Uuid::new_v4(), ProjectAction::ViewProject)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_require_system_admin() {
        let store = MemoryStore::new();
        let admin = user(&store, "admin@example.com", SystemRole::Admin).await;
        let plain = user(&store, "plain@example.com", SystemRole::User).await;

        assert!(require_system_admin(&store, AuthUser::new(admin)).await.is_ok());
        assert!(matches!(
            require_system_admin(&store, AuthUser::new(plain)).await,
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn test_task_ownership_is_identity_only() {
        let creator = Uuid::new_v4();
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: creator,
            title: "t".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            assigned_to: None,
            assignee_name: None,
            assignee_email: None,
            created_at: now,
            updated_at: now,
        };

        assert!(require_task_owner(AuthUser::new(creator), &task).is_ok());
        assert!(require_task_owner(AuthUser::new(Uuid::new_v4()), &task).is_err());
    }
}
