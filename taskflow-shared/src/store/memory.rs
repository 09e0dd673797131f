/// In-memory store
///
/// Keeps every table in insertion-ordered vectors behind a single tokio `RwLock`.
/// Constraints mirror the PostgreSQL schema: unique emails, one membership per
/// (project, user), foreign keys checked on insert, and the same cascades on delete.
///
/// Intended for tests and local demos. Data is lost on drop.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    CreateProject, CreateUser, Membership, NewTask, Project, ProjectMember, ProjectRole, Task,
    UpdateProject, UpdateTask, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    memberships: Vec<Membership>,
    tasks: Vec<Task>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn membership_mut(&mut self, project_id: Uuid, user_id: Uuid) -> Option<&mut Membership> {
        self.memberships
            .iter_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
    }

    /// Fills the denormalized assignee fields
    fn hydrate(&self, mut task: Task) -> Task {
        match task.assigned_to.and_then(|id| self.user(id)) {
            Some(user) => {
                task.assignee_name = Some(user.name.clone());
                task.assignee_email = Some(user.email.clone());
            }
            None => {
                task.assignee_name = None;
                task.assignee_email = None;
            }
        }
        task
    }

    fn check_assignee(&self, assigned_to: Option<Uuid>) -> StoreResult<()> {
        match assigned_to {
            Some(id) if self.user(id).is_none() => Err(StoreError::InvalidReference(format!(
                "assigned_to references missing user {id}"
            ))),
            _ => Ok(()),
        }
    }
}

/// `Store` backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, input: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                input.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            password_hash: input.password_hash,
            name: input.name,
            system_role: input.system_role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables.user(id).cloned().ok_or(StoreError::NotFound("user"))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().rev().cloned().collect())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if tables.user(id).is_none() {
            return Err(StoreError::NotFound("user"));
        }
        if tables
            .memberships
            .iter()
            .any(|m| m.user_id == id && m.role == ProjectRole::Owner)
        {
            return Err(StoreError::Conflict(format!("user {} still owns projects", id)));
        }

        tables.tasks.retain(|t| t.user_id != id);
        for task in tables.tasks.iter_mut() {
            if task.assigned_to == Some(id) {
                task.assigned_to = None;
            }
        }
        tables.memberships.retain(|m| m.user_id != id);
        tables.users.retain(|u| u.id != id);

        Ok(())
    }

    async fn create_project_with_owner(
        &self,
        input: CreateProject,
        owner_id: Uuid,
    ) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;

        if tables.user(owner_id).is_none() {
            return Err(StoreError::InvalidReference(format!(
                "owner references missing user {owner_id}"
            )));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        };

        tables.projects.push(project.clone());
        tables
            .memberships
            .push(Membership::new(project.id, owner_id, ProjectRole::Owner));

        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Project> {
        let tables = self.tables.read().await;
        tables
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("project"))
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().rev().cloned().collect())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .rev()
            .filter(|p| {
                tables
                    .memberships
                    .iter()
                    .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn update_project(&self, id: Uuid, input: UpdateProject) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound("project"))?;

        input.apply(project);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if !tables.project_exists(id) {
            return Err(StoreError::NotFound("project"));
        }

        tables.tasks.retain(|t| t.project_id != id);
        tables.memberships.retain(|m| m.project_id != id);
        tables.projects.retain(|p| p.id != id);

        Ok(())
    }

    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<ProjectRole> {
        let tables = self.tables.read().await;
        tables
            .memberships
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .map(|m| m.role)
            .ok_or(StoreError::NotFound("membership"))
    }

    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                tables.user(m.user_id).map(|u| ProjectMember {
                    id: m.id,
                    project_id: m.project_id,
                    user_id: m.user_id,
                    role: m.role,
                    joined_at: m.joined_at,
                    user_name: u.name.clone(),
                    user_email: u.email.clone(),
                })
            })
            .collect())
    }

    async fn upsert_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if !tables.project_exists(project_id) {
            return Err(StoreError::InvalidReference(format!(
                "membership references missing project {project_id}"
            )));
        }
        if tables.user(user_id).is_none() {
            return Err(StoreError::InvalidReference(format!(
                "membership references missing user {user_id}"
            )));
        }

        match tables.membership_mut(project_id, user_id) {
            Some(existing) => existing.role = role,
            None => tables
                .memberships
                .push(Membership::new(project_id, user_id, role)),
        }

        Ok(())
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.membership_mut(project_id, user_id) {
            Some(existing) => {
                existing.role = role;
                true
            }
            None => false,
        })
    }

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(tables.memberships.len() < before)
    }

    async fn create_task(&self, input: NewTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;

        if !tables.project_exists(input.project_id) {
            return Err(StoreError::InvalidReference(format!(
                "task references missing project {}",
                input.project_id
            )));
        }
        if tables.user(input.user_id).is_none() {
            return Err(StoreError::InvalidReference(format!(
                "task references missing user {}",
                input.user_id
            )));
        }
        tables.check_assignee(input.assigned_to)?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            user_id: input.user_id,
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            assigned_to: input.assigned_to,
            assignee_name: None,
            assignee_email: None,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());

        Ok(tables.hydrate(task))
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Task> {
        let tables = self.tables.read().await;
        let task = tables
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("task"))?;
        Ok(tables.hydrate(task))
    }

    async fn list_tasks_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .map(|t| tables.hydrate(t.clone()))
            .collect())
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.project_id == project_id)
            .map(|t| tables.hydrate(t.clone()))
            .collect())
    }

    async fn update_task(&self, id: Uuid, owner_id: Uuid, input: UpdateTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;

        if let Some(assigned_to) = input.assigned_to {
            tables.check_assignee(assigned_to)?;
        }

        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner_id)
            .ok_or(StoreError::NotFound("task"))?;

        input.apply(task);
        let updated = task.clone();

        Ok(tables.hydrate(updated))
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables
            .tasks
            .retain(|t| !(t.id == id && t.user_id == owner_id));

        if tables.tasks.len() == before {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SystemRole, TaskPriority, TaskStatus};

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                name: email.to_string(),
                system_role: SystemRole::User,
            })
            .await
            .unwrap()
    }

    fn project_input(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn task_input(project_id: Uuid, user_id: Uuid) -> NewTask {
        NewTask {
            project_id,
            user_id,
            title: "task".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "a@example.com").await;

        let err = store
            .create_user(CreateUser {
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "again".to_string(),
                system_role: SystemRole::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_project_grants_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;

        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();

        assert_eq!(
            store.get_membership(project.id, owner.id).await.unwrap(),
            ProjectRole::Owner
        );
    }

    #[tokio::test]
    async fn test_create_project_for_missing_owner_leaves_nothing() {
        let store = MemoryStore::new();

        let err = store
            .create_project_with_owner(project_input("p"), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidReference(_)));
        assert!(store.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_role() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let other = user(&store, "other@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();

        store
            .upsert_membership(project.id, other.id, ProjectRole::Viewer)
            .await
            .unwrap();
        store
            .upsert_membership(project.id, other.id, ProjectRole::Member)
            .await
            .unwrap();

        let members = store.list_members(project.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user_id, owner.id);
        assert_eq!(members[1].role, ProjectRole::Member);
        assert_eq!(members[1].user_email, "other@example.com");
    }

    #[tokio::test]
    async fn test_update_and_delete_membership_report_rows() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();
        let stranger = Uuid::new_v4();

        assert!(!store
            .update_membership_role(project.id, stranger, ProjectRole::Viewer)
            .await
            .unwrap());
        assert!(!store.delete_membership(project.id, stranger).await.unwrap());
        assert!(store.delete_membership(project.id, owner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_task_writes_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let other = user(&store, "other@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();
        let task = store
            .create_task(task_input(project.id, owner.id))
            .await
            .unwrap();

        let err = store
            .update_task(task.id, other.id, UpdateTask::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.delete_task(task.id, other.id).await.unwrap_err().is_not_found());

        store.delete_task(task.id, owner.id).await.unwrap();
        assert!(store.get_task(task.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_task_assignee_denormalized() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let assignee = user(&store, "assignee@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();

        let task = store
            .create_task(NewTask {
                assigned_to: Some(assignee.id),
                ..task_input(project.id, owner.id)
            })
            .await
            .unwrap();

        assert_eq!(task.assignee_email.as_deref(), Some("assignee@example.com"));

        let err = store
            .create_task(NewTask {
                assigned_to: Some(Uuid::new_v4()),
                ..task_input(project.id, owner.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let doomed = user(&store, "doomed@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();
        store
            .upsert_membership(project.id, doomed.id, ProjectRole::Member)
            .await
            .unwrap();
        let own_task = store
            .create_task(task_input(project.id, doomed.id))
            .await
            .unwrap();
        let assigned = store
            .create_task(NewTask {
                assigned_to: Some(doomed.id),
                ..task_input(project.id, owner.id)
            })
            .await
            .unwrap();

        store.delete_user(doomed.id).await.unwrap();

        assert!(store.get_user_by_id(doomed.id).await.unwrap_err().is_not_found());
        assert!(store.get_task(own_task.id).await.unwrap_err().is_not_found());
        assert!(store
            .get_membership(project.id, doomed.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(store.get_task(assigned.id).await.unwrap().assigned_to, None);

        assert!(store.delete_user(doomed.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_user_refuses_project_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();
        store
            .create_task(task_input(project.id, owner.id))
            .await
            .unwrap();

        let err = store.delete_user(owner.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Nothing was touched
        assert!(store.get_user_by_id(owner.id).await.is_ok());
        assert_eq!(
            store.get_membership(project.id, owner.id).await.unwrap(),
            ProjectRole::Owner
        );
        assert_eq!(store.list_tasks_by_project(project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let project = store
            .create_project_with_owner(project_input("p"), owner.id)
            .await
            .unwrap();
        store
            .create_task(task_input(project.id, owner.id))
            .await
            .unwrap();

        store.delete_project(project.id).await.unwrap();

        assert!(store.list_tasks_by_user(owner.id).await.unwrap().is_empty());
        assert!(store.list_projects_for_user(owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_newest_first() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let first = store
            .create_project_with_owner(project_input("first"), owner.id)
            .await
            .unwrap();
        let second = store
            .create_project_with_owner(project_input("second"), owner.id)
            .await
            .unwrap();

        let listed = store.list_projects_for_user(owner.id).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
