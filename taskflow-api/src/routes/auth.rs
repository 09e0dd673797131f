/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get tokens
/// - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
/// - `GET /api/auth/me` - Current user (authenticated)

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use taskflow_shared::auth::middleware::AuthUser;
use taskflow_shared::models::User;
use taskflow_shared::services::session::{self, AuthSession, Registration};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "secret", "name": "Jane Doe" }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "access_token": "eyJ...", "refresh_token": "eyJ...", "user": { "id": "uuid", ... } }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    validate_request(&req)?;

    let auth_session = session::register(
        state.store.as_ref(),
        &state.tokens,
        &state.passwords,
        Registration {
            email: req.email,
            password: req.password,
            name: req.name,
        },
    )
    .await
    .map_err(|e| state.error(e))?;

    Ok((StatusCode::CREATED, Json(auth_session)))
}

/// Login with email and password
///
/// An unknown email and a wrong password both return
/// `401 {"error": "unauthorized", "message": "Invalid email or password"}`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    validate_request(&req)?;

    let auth_session = session::login(
        state.store.as_ref(),
        &state.tokens,
        &state.passwords,
        &req.email,
        &req.password,
    )
    .await
    .map_err(|e| state.error(e))?;

    Ok(Json(auth_session))
}

/// Rotate tokens
///
/// The presented refresh token is not revoked.
///
/// # Errors
///
/// - `401 Unauthorized`: Not a valid refresh token
/// - `404 Not Found`: The token's user was deleted
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthSession>> {
    let auth_session = session::refresh(state.store.as_ref(), &state.tokens, &req.refresh_token)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(auth_session))
}

pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<User>> {
    let user = session::me(state.store.as_ref(), auth)
        .await
        .map_err(|e| state.error(e))?;

    Ok(Json(user))
}
