/// Role-gated domain operations
///
/// Each operation takes the store, the authenticated caller and its inputs
/// explicitly, runs the authorization check, then performs the write.
///
/// # Modules
///
/// - `session`: Registration, login, token rotation, current user
/// - `projects`: Project CRUD and the membership lifecycle
/// - `tasks`: Task CRUD under project RBAC and creator ownership
/// - `admin`: System-admin user management

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

pub mod admin;
pub mod projects;
pub mod session;
pub mod tasks;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or invalid session credentials
    #[error("Unauthorized")]
    Unauthenticated,

    /// Login failed; never says which half was wrong
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ServiceError::NotFound(not_found_message(entity)),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(message) => ServiceError::Forbidden(message),
            AuthzError::Store(e) => e.into(),
        }
    }
}

fn not_found_message(entity: &str) -> String {
    match entity {
        "user" => "User not found".to_string(),
        "project" => "Project not found".to_string(),
        "task" => "Task not found".to_string(),
        "membership" => "Member not found".to_string(),
        _ => "Resource not found".to_string(),
    }
}

/// Trims a required text field, failing with `message` if nothing is left
pub(crate) fn required(value: &str, message: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(message.to_string()));
    }
    Ok(trimmed.to_string())
}
