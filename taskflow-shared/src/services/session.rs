/// Session lifecycle: registration, login, refresh and current-user lookup
///
/// Every successful registration, login or refresh returns a fresh access +
/// refresh pair together with the user record.

use serde::Serialize;

use super::{required, ServiceError, ServiceResult};
use crate::auth::jwt::{TokenError, TokenService};
use crate::auth::middleware::AuthUser;
use crate::auth::password::PasswordService;
use crate::models::{CreateUser, SystemRole, User};
use crate::store::{Store, StoreError};

/// Token pair plus the authenticated user
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

impl AuthSession {
    fn issue(tokens: &TokenService, user: User) -> ServiceResult<Self> {
        let pair = tokens.issue_pair(user.id)?;
        Ok(Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user,
        })
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Emails are compared trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an account with the `user` system role and signs it in
///
/// # Errors
///
/// - `Conflict` if the email is already registered
/// - `BadRequest` if a required field is blank
pub async fn register(
    store: &dyn Store,
    tokens: &TokenService,
    passwords: &PasswordService,
    input: Registration,
) -> ServiceResult<AuthSession> {
    let email = normalize_email(&input.email);
    if email.is_empty() {
        return Err(ServiceError::BadRequest("Email is required".to_string()));
    }
    let name = required(&input.name, "Name is required")?;

    match store.get_user_by_email(&email).await {
        Ok(_) => return Err(ServiceError::Conflict("User already exists".to_string())),
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = passwords.hash(&input.password)?;

    let user = store
        .create_user(CreateUser {
            email,
            password_hash,
            name,
            system_role: SystemRole::User,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            StoreError::Conflict(_) => ServiceError::Conflict("Email already exists".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User registered");

    AuthSession::issue(tokens, user)
}

/// Verifies credentials and signs the user in
///
/// An unknown email and a wrong password produce the same
/// `ServiceError::InvalidCredentials`, and both pay for an Argon2 run.
pub async fn login(
    store: &dyn Store,
    tokens: &TokenService,
    passwords: &PasswordService,
    email: &str,
    password: &str,
) -> ServiceResult<AuthSession> {
    let user = match store.get_user_by_email(&normalize_email(email)).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            tracing::debug!("Login attempt for unknown email");
            passwords.dummy_verify(password)?;
            return Err(ServiceError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !passwords.verify(password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    AuthSession::issue(tokens, user)
}

/// Exchanges a refresh token for a new pair
///
/// The presented refresh token stays valid until it expires.
///
/// # Errors
///
/// - `Unauthenticated` if the token is not a valid refresh token
/// - `NotFound` if its subject no longer exists
pub async fn refresh(
    store: &dyn Store,
    tokens: &TokenService,
    refresh_token: &str,
) -> ServiceResult<AuthSession> {
    let user_id = tokens.validate_refresh(refresh_token).map_err(|e| match e {
        TokenError::Invalid(reason) => {
            tracing::debug!(reason = %reason, "Refresh token rejected");
            ServiceError::Unauthenticated
        }
        other => other.into(),
    })?;

    let user = store.get_user_by_id(user_id).await?;

    AuthSession::issue(tokens, user)
}

/// Current user's record
pub async fn me(store: &dyn Store, auth: AuthUser) -> ServiceResult<User> {
    Ok(store.get_user_by_id(auth.user_id).await?)
}
