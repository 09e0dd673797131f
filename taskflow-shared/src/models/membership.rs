/// Project membership model
///
/// A membership grants one user one role on one project. There is at most one
/// membership per (project, user) pair.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     role VARCHAR(20) NOT NULL,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// Stored and serialized with their legacy labels:
///
/// - **PO** (Owner): Full control, the only role that may delete the project or change roles
/// - **PM** (Manager): Update the project, invite and remove members
/// - **Member**: Create tasks
/// - **Viewer**: Read-only access

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ParseEnumError;

/// Closed set of per-project roles
///
/// Deserialization accepts both the legacy labels (`"PO"`, `"PM"`) and the
/// descriptive names (`"Owner"`, `"Manager"`); any other string is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectRole {
    #[serde(rename = "PO", alias = "Owner")]
    Owner,

    #[serde(rename = "PM", alias = "Manager")]
    Manager,

    Member,

    Viewer,
}

impl ProjectRole {
    /// Wire/storage label
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "PO",
            ProjectRole::Manager => "PM",
            ProjectRole::Member => "Member",
            ProjectRole::Viewer => "Viewer",
        }
    }

    /// Human-readable name used in denial messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "Owner",
            ProjectRole::Manager => "Manager",
            ProjectRole::Member => "Member",
            ProjectRole::Viewer => "Viewer",
        }
    }

    /// Roles that can be granted through invitation or role change
    pub const ASSIGNABLE: [ProjectRole; 3] =
        [ProjectRole::Manager, ProjectRole::Member, ProjectRole::Viewer];

    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PO" | "Owner" => Ok(ProjectRole::Owner),
            "PM" | "Manager" => Ok(ProjectRole::Manager),
            "Member" => Ok(ProjectRole::Member),
            "Viewer" => Ok(ProjectRole::Viewer),
            other => Err(ParseEnumError::new("project role", other)),
        }
    }
}

/// Membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(project_id: Uuid, user_id: Uuid, role: ProjectRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// Member listing view: the membership joined with the user's public fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}
