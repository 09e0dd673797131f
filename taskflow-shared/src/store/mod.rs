/// Persistence seam
///
/// Every read and write the services perform goes through the [`Store`] trait.
/// Two backends are provided:
///
/// - [`postgres::PgStore`]: sqlx-backed, used by the server
/// - [`memory::MemoryStore`]: `RwLock`-guarded maps, used by tests and demos
///
/// The store is the only arbiter of consistency. Multi-row writes that must be
/// atomic (project + owner grant, user deletion cascade) are single trait methods
/// so each backend can make them atomic in its own way.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CreateProject, CreateUser, NewTask, Project, ProjectMember, ProjectRole, Task, UpdateProject,
    UpdateTask, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Row is absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Required value missing or check constraint violated
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend unreachable or saturated
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row"),
            sqlx::Error::Database(db_err) => {
                let detail = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => StoreError::Conflict(detail),
                    ErrorKind::ForeignKeyViolation => StoreError::InvalidReference(detail),
                    ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                        StoreError::InvalidInput(detail)
                    }
                    _ => StoreError::Database(detail),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Database(err.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations used by the services
///
/// Reads return `StoreError::NotFound` when the row is absent. Boolean results on
/// writes report whether any row was affected.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn create_user(&self, input: CreateUser) -> StoreResult<User>;

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// All users, newest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Deletes the user's tasks, then their memberships, then the user, atomically
    ///
    /// Fails with `Conflict` while the user is Owner of any project, so no
    /// project is left without an Owner.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    // Projects

    /// Inserts the project and grants `owner_id` the Owner role atomically
    async fn create_project_with_owner(
        &self,
        input: CreateProject,
        owner_id: Uuid,
    ) -> StoreResult<Project>;

    async fn get_project(&self, id: Uuid) -> StoreResult<Project>;

    /// All projects, newest first
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Projects `user_id` is a member of, newest first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, input: UpdateProject) -> StoreResult<Project>;

    async fn delete_project(&self, id: Uuid) -> StoreResult<()>;

    // Memberships

    /// Role of `user_id` on `project_id`
    async fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<ProjectRole>;

    /// Members with their names and emails, oldest membership first
    async fn list_members(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>>;

    /// Inserts or replaces the membership for (project, user)
    async fn upsert_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<()>;

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<bool>;

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // Tasks

    async fn create_task(&self, input: NewTask) -> StoreResult<Task>;

    async fn get_task(&self, id: Uuid) -> StoreResult<Task>;

    /// Tasks created by `user_id`, newest first
    async fn list_tasks_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Tasks in a project, newest first
    async fn list_tasks_by_project(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Updates a task only if `owner_id` created it; `NotFound` otherwise
    async fn update_task(&self, id: Uuid, owner_id: Uuid, input: UpdateTask) -> StoreResult<Task>;

    /// Deletes a task only if `owner_id` created it; `NotFound` otherwise
    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()>;

    /// Connectivity check for `/health`
    async fn ping(&self) -> StoreResult<()>;
}
