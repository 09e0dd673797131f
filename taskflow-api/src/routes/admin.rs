/// System-admin endpoints
///
/// # Endpoints
///
/// - `GET /api/admin/users` - List every user
/// - `DELETE /api/admin/users/:id` - Delete a user with their tasks and memberships

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskflow_shared::auth::middleware::AuthUser;
use taskflow_shared::models::User;
use taskflow_shared::services::admin;
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<User>>> {
    let users = admin::list_users(state.store.as_ref(), auth)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(users))
}

/// # Errors
///
/// - `400 Bad Request`: Admins cannot delete their own account
/// - `403 Forbidden`: Caller is not a system admin
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    admin::delete_user(state.store.as_ref(), auth, user_id)
        .await
        .map_err(|e| state.error(e))?;

    Ok(StatusCode::NO_CONTENT)
}
