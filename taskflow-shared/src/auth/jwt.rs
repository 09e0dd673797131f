/// JWT token service
///
/// Issues and validates the two session credentials used by TaskFlow:
///
/// - **Access Token**: Short-lived (15 minutes), presented as `Authorization: Bearer <token>`
/// - **Refresh Token**: Long-lived (7 days), used only to mint a new token pair
///
/// Tokens are stateless. Nothing is persisted and there is no revocation list,
/// so validity is purely signature + expiry + type discriminator.
///
/// # Wire Format
///
/// ```json
/// { "user_id": "<uuid>", "type": "access", "iat": 1700000000, "exp": 1700000900 }
/// ```
///
/// The `type` claim is exactly `"access"` or `"refresh"`. Presenting one kind where
/// the other is required always fails.
///
/// # Security
///
/// - **Signing**: HS256 on issue. HS384/HS512 are accepted on validation, other families are not.
/// - **Expiration**: Checked with zero leeway
/// - **Secret Management**: The secret is injected through [`TokenConfig`] at construction
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::jwt::{TokenConfig, TokenService};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new("your-secret-key-at-least-32-bytes"))?;
/// let user_id = Uuid::new_v4();
///
/// let refresh = tokens.issue_refresh(user_id)?;
/// assert_eq!(tokens.validate_refresh(&refresh)?, user_id);
///
/// let pair = tokens.rotate(&refresh)?;
/// assert_eq!(tokens.validate_access(&pair.access_token)?, user_id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Default refresh token lifetime
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No signing secret configured
    #[error("JWT signing secret is not configured")]
    MissingSecret,

    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    Encode(String),

    /// Token was rejected
    #[error("Invalid token: {0}")]
    Invalid(InvalidToken),
}

/// Reason a presented token was rejected
///
/// Only used for logging and tests. Callers outside the token boundary must
/// collapse every variant into the same generic denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToken {
    /// Signature does not verify against the configured secret
    #[error("bad signature")]
    BadSignature,

    /// Header names an algorithm outside the HMAC family
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    /// `exp` is in the past
    #[error("token expired")]
    Expired,

    /// Not a JWT, or the claims do not have the expected shape
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Subject is missing or nil
    #[error("missing subject")]
    MissingSubject,

    /// Access token presented as refresh token or vice versa
    #[error("expected {expected} token, got {actual} token")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },
}

impl From<InvalidToken> for TokenError {
    fn from(reason: InvalidToken) -> Self {
        TokenError::Invalid(reason)
    }
}

/// Token type discriminator carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived session credential
    Access,

    /// Long-lived credential used only for rotation
    Refresh,
}

impl TokenType {
    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
///
/// Fixed shape; every field is required on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    #[serde(rename = "user_id")]
    pub sub: Uuid,

    /// Token type discriminator
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    ///
    /// A negative duration yields an already-expired token, which is handy in tests.
    pub fn with_expiration(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            token_type,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Token service configuration
///
/// Built once at startup and handed to [`TokenService::new`].
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,

    /// Access token lifetime
    pub access_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Creates a config with the default 15 minute / 7 day lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Access + refresh token pair returned on login, registration and rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Issues and validates access/refresh tokens
///
/// Cheap to clone; keys are shared behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service from explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingSecret` if the secret is empty
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let secret = config.secret.as_bytes();

        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation,
            }),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Lifetime applied to a token type
    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Issues a signed access token for `user_id`
    pub fn issue_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(user_id, TokenType::Access)
    }

    /// Issues a signed refresh token for `user_id`
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(user_id, TokenType::Refresh)
    }

    /// Issues both tokens for `user_id`
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id)?,
            refresh_token: self.issue_refresh(user_id)?,
        })
    }

    fn issue(&self, user_id: Uuid, token_type: TokenType) -> Result<String, TokenError> {
        let claims = Claims::with_expiration(user_id, token_type, self.ttl(token_type));
        self.sign(&claims)
    }

    /// Signs arbitrary claims with HS256
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Validates an access token and returns its subject
    pub fn validate_access(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate(token, TokenType::Access)
    }

    /// Validates a refresh token and returns its subject
    pub fn validate_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate(token, TokenType::Refresh)
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;

        if claims.token_type != expected {
            return Err(InvalidToken::WrongType {
                expected,
                actual: claims.token_type,
            }
            .into());
        }

        if claims.sub.is_nil() {
            return Err(InvalidToken::MissingSubject.into());
        }

        Ok(claims.sub)
    }

    /// Verifies signature and expiry and decodes the claims without checking the type
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &self.keys.validation).map_err(
            |e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => InvalidToken::Expired,
                    ErrorKind::InvalidSignature => InvalidToken::BadSignature,
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        InvalidToken::UnsupportedAlgorithm
                    }
                    _ => InvalidToken::Malformed(e.to_string()),
                };
                TokenError::Invalid(reason)
            },
        )?;

        Ok(data.claims)
    }

    /// Exchanges a refresh token for a fresh access + refresh pair
    ///
    /// The presented refresh token is NOT invalidated. There is no server-side
    /// blacklist, so it remains usable until its own `exp`.
    pub fn rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let user_id = self.validate_refresh(refresh_token)?;
        self.issue_pair(user_id)
    }
}
