/// End-to-end membership and authorization scenarios against the in-memory store
///
/// Run with: cargo test -p taskflow-shared --test membership_lifecycle_tests

use taskflow_shared::auth::authorization::{has_access, has_role};
use taskflow_shared::auth::middleware::AuthUser;
use taskflow_shared::models::{
    CreateProject, CreateUser, ProjectRole, SystemRole, UpdateProject, UpdateTask,
};
use taskflow_shared::services::{admin, projects, tasks, ServiceError};
use taskflow_shared::store::{MemoryStore, Store};
use uuid::Uuid;

async fn create_user(store: &MemoryStore, email: &str, system_role: SystemRole) -> AuthUser {
    let user = store
        .create_user(CreateUser {
            email: email.to_string(),
            password_hash: "unused".to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            system_role,
        })
        .await
        .expect("Failed to create user");
    AuthUser::new(user.id)
}

async fn create_project(store: &MemoryStore, owner: AuthUser, name: &str) -> Uuid {
    projects::create_project(
        store,
        owner,
        CreateProject {
            name: name.to_string(),
            description: String::new(),
        },
    )
    .await
    .expect("Failed to create project")
    .id
}

fn rename(name: &str) -> UpdateProject {
    UpdateProject {
        name: Some(name.to_string()),
        description: None,
    }
}

#[tokio::test]
async fn test_new_project_has_exactly_one_owner() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;

    for name in ["one", "two", "three"] {
        let project_id = create_project(&store, a, name).await;
        let members = store.list_members(project_id).await.unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, a.user_id);
        assert_eq!(members[0].role, ProjectRole::Owner);
    }
}

#[tokio::test]
async fn test_full_membership_scenario() {
    let store = MemoryStore::new();
    let admin_user = create_user(&store, "admin@example.com", SystemRole::Admin).await;
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let b = create_user(&store, "b@example.com", SystemRole::User).await;
    let c = create_user(&store, "c@example.com", SystemRole::User).await;

    // A creates P and becomes Owner
    let p = create_project(&store, a, "P").await;
    assert_eq!(store.get_membership(p, a.user_id).await.unwrap(), ProjectRole::Owner);

    // A invites B as Member
    projects::invite_member(&store, a, p, "b@example.com", "Member")
        .await
        .unwrap();
    assert_eq!(store.get_membership(p, b.user_id).await.unwrap(), ProjectRole::Member);

    // B cannot update P
    let err = projects::update_project(&store, b, p, rename("B's project"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(ref m) if m.contains("Owner or Manager")));

    // B cannot invite while still a Member
    let err = projects::invite_member(&store, b, p, "c@example.com", "Viewer")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // A promotes B to Manager; B can now invite
    projects::update_member_role(&store, a, p, b.user_id, "Manager")
        .await
        .unwrap();
    projects::invite_member(&store, b, p, "c@example.com", "Viewer")
        .await
        .unwrap();
    assert_eq!(store.get_membership(p, c.user_id).await.unwrap(), ProjectRole::Viewer);

    // B creates a task in P
    let task = tasks::create_task(
        &store,
        b,
        p,
        tasks::TaskDraft {
            title: "Write docs".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Admin deletes B: membership and tasks are gone
    admin::delete_user(&store, admin_user, b.user_id).await.unwrap();

    assert!(store.get_membership(p, b.user_id).await.unwrap_err().is_not_found());
    assert!(store.get_task(task.id).await.unwrap_err().is_not_found());

    let remaining: Vec<_> = store
        .list_members(p)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.user_id, m.role))
        .collect();
    assert_eq!(
        remaining,
        vec![(a.user_id, ProjectRole::Owner), (c.user_id, ProjectRole::Viewer)]
    );
}

#[tokio::test]
async fn test_deleting_sole_invitee_leaves_only_owner() {
    let store = MemoryStore::new();
    let admin_user = create_user(&store, "admin@example.com", SystemRole::Admin).await;
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let b = create_user(&store, "b@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;

    projects::invite_member(&store, a, p, "b@example.com", "Member")
        .await
        .unwrap();
    admin::delete_user(&store, admin_user, b.user_id).await.unwrap();

    let members = store.list_members(p).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, a.user_id);
}

#[tokio::test]
async fn test_owner_deletion_refused_while_projects_remain() {
    let store = MemoryStore::new();
    let admin_user = create_user(&store, "admin@example.com", SystemRole::Admin).await;
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;
    let q = create_project(&store, a, "Q").await;

    let err = admin::delete_user(&store, admin_user, a.user_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    for project in [p, q] {
        let owners: Vec<_> = store
            .list_members(project)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.role == ProjectRole::Owner)
            .collect();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].user_id, a.user_id);
    }

    // Still refused with one project left
    projects::delete_project(&store, a, p).await.unwrap();
    assert!(admin::delete_user(&store, admin_user, a.user_id).await.is_err());

    projects::delete_project(&store, a, q).await.unwrap();
    admin::delete_user(&store, admin_user, a.user_id).await.unwrap();
}

#[tokio::test]
async fn test_owner_cannot_delete_someone_elses_task() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let b = create_user(&store, "b@example.com", SystemRole::User).await;
    let c = create_user(&store, "c@example.com", SystemRole::User).await;

    // C owns the project; A is a Member who creates a task assigned to B
    let p = create_project(&store, c, "P").await;
    projects::invite_member(&store, c, p, "a@example.com", "Member")
        .await
        .unwrap();
    projects::invite_member(&store, c, p, "b@example.com", "Member")
        .await
        .unwrap();

    let task = tasks::create_task(
        &store,
        a,
        p,
        tasks::TaskDraft {
            title: "T".to_string(),
            assigned_to: Some(b.user_id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(task.assignee_email.as_deref(), Some("b@example.com"));

    // Project Owner C is refused on every by-id operation
    assert!(matches!(
        tasks::delete_task(&store, c, task.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        tasks::update_task(&store, c, task.id, UpdateTask::default()).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        tasks::get_task(&store, c, task.id).await,
        Err(ServiceError::Forbidden(_))
    ));

    // Even the assignee cannot delete it
    assert!(matches!(
        tasks::delete_task(&store, b, task.id).await,
        Err(ServiceError::Forbidden(_))
    ));

    // The creator can
    tasks::delete_task(&store, a, task.id).await.unwrap();
}

#[tokio::test]
async fn test_system_admin_not_exempt_from_task_ownership() {
    let store = MemoryStore::new();
    let admin_user = create_user(&store, "admin@example.com", SystemRole::Admin).await;
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;

    let task = tasks::create_task(
        &store,
        a,
        p,
        tasks::TaskDraft {
            title: "T".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Project-level checks pass for the admin...
    assert_eq!(
        tasks::list_project_tasks(&store, admin_user, p).await.unwrap().len(),
        1
    );
    // ...but task ownership does not
    assert!(matches!(
        tasks::delete_task(&store, admin_user, task.id).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_admin_short_circuits_every_project_check() {
    let store = MemoryStore::new();
    let admin_user = create_user(&store, "admin@example.com", SystemRole::Admin).await;
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let b = create_user(&store, "b@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;

    for roles in [
        &[][..],
        &[ProjectRole::Owner][..],
        &[ProjectRole::Owner, ProjectRole::Manager][..],
    ] {
        assert!(has_role(&store, admin_user.user_id, p, roles).await.unwrap());
    }

    projects::update_project(&store, admin_user, p, rename("Renamed by admin"))
        .await
        .unwrap();
    projects::invite_member(&store, admin_user, p, "b@example.com", "Manager")
        .await
        .unwrap();
    projects::update_member_role(&store, admin_user, p, b.user_id, "Viewer")
        .await
        .unwrap();
    projects::remove_member(&store, admin_user, p, b.user_id)
        .await
        .unwrap();
    projects::delete_project(&store, admin_user, p).await.unwrap();

    assert!(store.get_project(p).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_viewer_reads_but_cannot_write() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let v = create_user(&store, "v@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;
    projects::invite_member(&store, a, p, "v@example.com", "Viewer")
        .await
        .unwrap();

    assert!(has_access(&store, v.user_id, p).await.unwrap());
    assert!(!has_role(&store, v.user_id, p, &[ProjectRole::Owner, ProjectRole::Manager])
        .await
        .unwrap());

    assert!(projects::get_project(&store, v, p).await.is_ok());
    assert_eq!(projects::list_members(&store, v, p).await.unwrap().len(), 2);
    assert!(tasks::list_project_tasks(&store, v, p).await.is_ok());

    let err = tasks::create_task(
        &store,
        v,
        p,
        tasks::TaskDraft {
            title: "nope".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_manager_permissions() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let m = create_user(&store, "m@example.com", SystemRole::User).await;
    let x = create_user(&store, "x@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;
    projects::invite_member(&store, a, p, "m@example.com", "Manager")
        .await
        .unwrap();

    // Allowed: update, invite, remove
    projects::update_project(&store, m, p, rename("Managed")).await.unwrap();
    projects::invite_member(&store, m, p, "x@example.com", "Member")
        .await
        .unwrap();
    projects::remove_member(&store, m, p, x.user_id).await.unwrap();

    // Denied: role change, delete
    projects::invite_member(&store, m, p, "x@example.com", "Member")
        .await
        .unwrap();
    let err = projects::update_member_role(&store, m, p, x.user_id, "Manager")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(ref msg) if msg == "Only Owner can update member roles"));

    let err = projects::delete_project(&store, m, p).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(ref msg) if msg == "Only Owner can delete project"));
}

#[tokio::test]
async fn test_invite_unknown_email_creates_nothing() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;

    let err = projects::invite_member(&store, a, p, "ghost@example.com", "Member")
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(store.list_members(p).await.unwrap().len(), 1);
    assert!(store
        .get_user_by_email("ghost@example.com")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let store = MemoryStore::new();
    let a = create_user(&store, "a@example.com", SystemRole::User).await;
    let outsider = create_user(&store, "out@example.com", SystemRole::User).await;
    let p = create_project(&store, a, "P").await;

    let err = tasks::create_task(
        &store,
        a,
        p,
        tasks::TaskDraft {
            title: "T".to_string(),
            assigned_to: Some(outsider.user_id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let task = tasks::create_task(
        &store,
        a,
        p,
        tasks::TaskDraft {
            title: "T".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = tasks::update_task(
        &store,
        a,
        task.id,
        UpdateTask {
            assigned_to: Some(Some(outsider.user_id)),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[tokio::test]
async fn test_unknown_ids_are_denied_not_errors() {
    let store = MemoryStore::new();

    let result = has_role(&store, Uuid::new_v4(), Uuid::new_v4(), &[ProjectRole::Owner]).await;
    assert!(matches!(result, Ok(false)));

    let result = has_access(&store, Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Ok(false)));
}
