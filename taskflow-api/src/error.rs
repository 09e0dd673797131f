/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; service failures are converted with
/// [`ApiError::from_service`], which decides the status code and whether store
/// details reach the client.
///
/// # Example
///
/// ```no_run
/// use taskflow_api::error::{ApiError, ApiResult};
/// use taskflow_shared::services::ServiceError;
///
/// fn handle(result: Result<(), ServiceError>) -> ApiResult<()> {
///     result.map_err(|e| ApiError::from_service(e, false))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskflow_shared::auth::jwt::TokenError;
use taskflow_shared::services::ServiceError;
use taskflow_shared::store::StoreError;
use validator::{Validate, ValidationErrors};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email
    Conflict(String),

    /// Unprocessable entity (422), request validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); `detail` is only shown when `expose` is set
    InternalError { detail: String, expose: bool },

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::InternalError {
            detail: detail.into(),
            expose: false,
        }
    }

    /// Maps a service failure onto an HTTP error
    ///
    /// With `expose_details` set (development), the underlying store error is
    /// appended to the message. Otherwise store failures are opaque.
    pub fn from_service(err: ServiceError, expose_details: bool) -> Self {
        match err {
            ServiceError::Unauthenticated => ApiError::Unauthorized("Unauthorized".to_string()),
            ServiceError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::BadRequest(msg) => ApiError::BadRequest(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Token(TokenError::Invalid(_)) => {
                ApiError::Unauthorized("Unauthorized".to_string())
            }
            ServiceError::Token(e) => ApiError::internal(format!("Token operation failed: {}", e)),
            ServiceError::Password(e) => {
                ApiError::internal(format!("Password operation failed: {}", e))
            }
            ServiceError::Store(e) => Self::from_store(e, expose_details),
        }
    }

    fn from_store(err: StoreError, expose_details: bool) -> Self {
        let message = |base: &str| {
            if expose_details {
                format!("{}: {}", base, err)
            } else {
                base.to_string()
            }
        };

        match &err {
            StoreError::NotFound(_) => ApiError::NotFound(message("Resource not found")),
            StoreError::Conflict(_) => ApiError::Conflict(message("Resource already exists")),
            StoreError::InvalidReference(_) => {
                ApiError::BadRequest(message("Referenced resource does not exist"))
            }
            StoreError::InvalidInput(_) => ApiError::BadRequest(message("Invalid input")),
            StoreError::Unavailable(_) => {
                ApiError::ServiceUnavailable(message("Service temporarily unavailable"))
            }
            StoreError::Database(_) => ApiError::InternalError {
                detail: err.to_string(),
                expose: expose_details,
            },
        }
    }
}

/// Runs `validator` rules on a request body, collecting field errors into a 422
pub fn validate_request<T: Validate>(req: &T) -> ApiResult<()> {
    req.validate().map_err(validation_error)
}

fn validation_error(e: ValidationErrors) -> ApiError {
    let mut errors: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    ApiError::ValidationError(errors)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError { detail, .. } => write!(f, "Internal error: {}", detail),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError { detail, expose } => {
                tracing::error!("Internal error: {}", detail);
                let message = if expose {
                    format!("An internal error occurred: {}", detail)
                } else {
                    "An internal error occurred".to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    message,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}
