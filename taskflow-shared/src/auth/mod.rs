/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: Access/refresh token issuance, validation and rotation
/// - [`middleware`]: Bearer-token session middleware for Axum
/// - [`authorization`]: Project role checks and task ownership checks
/// - [`password`]: Argon2id password hashing and verification
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::jwt::{TokenConfig, TokenService};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new("a-secret-of-at-least-32-bytes!!!"))?;
///
/// let user_id = Uuid::new_v4();
/// let access = tokens.issue_access(user_id)?;
/// assert_eq!(tokens.validate_access(&access)?, user_id);
///
/// // An access token is never accepted where a refresh token is required
/// assert!(tokens.validate_refresh(&access).is_err());
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
