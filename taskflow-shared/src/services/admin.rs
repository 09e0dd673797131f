/// System-admin user management

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::require_system_admin;
use crate::auth::middleware::AuthUser;
use crate::models::User;
use crate::store::{Store, StoreError};

pub async fn list_users(store: &dyn Store, auth: AuthUser) -> ServiceResult<Vec<User>> {
    require_system_admin(store, auth).await?;
    Ok(store.list_users().await?)
}

/// Deletes a user together with their tasks and memberships
///
/// The self-deletion guard compares identities, not roles: an admin can delete
/// other admins but never their own account.
///
/// # Errors
///
/// - `Forbidden` unless the caller is a system admin
/// - `BadRequest` if `target` is the caller
/// - `NotFound` if `target` does not exist
/// - `Conflict` while `target` is Owner of any project
pub async fn delete_user(store: &dyn Store, auth: AuthUser, target: Uuid) -> ServiceResult<()> {
    require_system_admin(store, auth).await?;

    if auth.user_id == target {
        return Err(ServiceError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    match store.delete_user(target).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(ServiceError::Conflict(
                "Cannot delete a user who owns projects".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %target, deleted_by = %auth.user_id, "User deleted by admin");
    Ok(())
}
