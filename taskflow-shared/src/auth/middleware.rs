/// Session middleware for Axum
///
/// Authenticates every protected request from its `Authorization: Bearer <token>`
/// header before any handler runs. On success the request carries an [`AuthUser`]
/// extension; handlers take it as a typed argument and pass it explicitly into
/// every domain call.
///
/// # Denial
///
/// Every failure (missing header, wrong scheme, bad signature, expired, wrong token
/// type) produces the same generic 401 body. The specific reason is only logged
/// at debug level.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskflow_shared::auth::jwt::{TokenConfig, TokenService};
/// use taskflow_shared::auth::middleware::{jwt_auth_middleware, AuthUser};
///
/// async fn whoami(auth: AuthUser) -> String {
///     auth.user_id.to_string()
/// }
///
/// # fn build() -> Result<Router, Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new("your-secret-key-at-least-32-bytes"))?;
///
/// let app: Router = Router::new()
///     .route("/me", get(whoami))
///     .layer(middleware::from_fn_with_state(tokens, jwt_auth_middleware));
/// # Ok(app)
/// # }
/// ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::TokenService;

/// Authenticated caller, inserted into request extensions by [`jwt_auth_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Subject of the validated access token
    pub user_id: Uuid,
}

impl AuthUser {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for the session middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed or invalid credentials
    #[error("Unauthorized")]
    Unauthenticated,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Unauthorized",
                })),
            )
                .into_response(),
        }
    }
}

/// Extracts the token from an `Authorization` header value
///
/// Only the exact form `Bearer <token>` is accepted: case-sensitive scheme, a
/// single space, and a non-empty token with no further whitespace.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::Unauthenticated);
    }

    Ok(token)
}

/// JWT session middleware
///
/// Mount with `axum::middleware::from_fn_with_state(tokens, jwt_auth_middleware)`.
///
/// # Errors
///
/// Returns [`AuthError::Unauthenticated`] without calling the handler if:
/// - Authorization header is missing or not valid ASCII
/// - Header is not exactly `Bearer <token>`
/// - Token fails access-token validation
pub async fn jwt_auth_middleware(
    State(tokens): State<TokenService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!("Missing Authorization header");
            AuthError::Unauthenticated
        })?;

    let token = parse_bearer(auth_header).map_err(|e| {
        tracing::debug!("Authorization header is not a Bearer token");
        e
    })?;

    let user_id = tokens.validate_access(token).map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AuthError::Unauthenticated
    })?;

    req.extensions_mut().insert(AuthUser::new(user_id));

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::Unauthenticated)
    }
}
