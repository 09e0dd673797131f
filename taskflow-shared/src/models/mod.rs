/// Domain models for TaskFlow
///
/// Plain data types shared by the store backends, the services and the HTTP layer.
/// Persistence lives behind [`crate::store::Store`]; nothing here talks to a database.
///
/// # Models
///
/// - `user`: Accounts and the system-wide role
/// - `project`: Projects
/// - `membership`: Per-project roles and the member listing view
/// - `task`: Tasks, their status/priority enums and update payloads

pub mod membership;
pub mod project;
pub mod task;
pub mod user;

pub use membership::{Membership, ProjectMember, ProjectRole};
pub use project::{CreateProject, Project, UpdateProject};
pub use task::{NewTask, Task, TaskPriority, TaskStatus, UpdateTask};
pub use user::{CreateUser, SystemRole, User};

/// Error returned when a wire string does not name a known enum value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
