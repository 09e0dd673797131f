/// Password hashing and verification
///
/// Passwords are stored as Argon2id PHC strings. The cost parameters are embedded
/// in every hash, so verification works across parameter changes.
///
/// # Parameters
///
/// - [`PasswordService::default`]: 64 MB memory, 3 iterations, 4 lanes
/// - [`PasswordService::with_params`]: explicit costs (tests use a cheap setting)
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::password::PasswordService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let passwords = PasswordService::with_params(1024, 1, 1)?;
/// let hash = passwords.hash("correct horse battery staple")?;
///
/// assert!(passwords.verify("correct horse battery staple", &hash)?);
/// assert!(!passwords.verify("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Failed to verify password: {0}")]
    Verify(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id hasher with fixed cost parameters
#[derive(Debug, Clone)]
pub struct PasswordService {
    params: Params,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self {
            params: ParamsBuilder::new()
                .m_cost(65536)
                .t_cost(3)
                .p_cost(4)
                .output_len(32)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl PasswordService {
    /// Creates a hasher with explicit memory (KiB), iteration and lane counts
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Hash` if the combination is rejected by Argon2
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::Hash(format!("invalid parameters: {e}")))?;

        Ok(Self { params })
    }

    /// Hashes a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Checks a password against a stored hash in constant time
    ///
    /// A mismatch is `Ok(false)`; only a corrupt hash or internal failure is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Verify(e.to_string())),
        }
    }

    /// Burns the cost of one verification without a stored hash
    ///
    /// Call this when there is no account to check against, so a missing user
    /// takes as long to reject as a wrong password.
    pub fn dummy_verify(&self, password: &str) -> Result<(), PasswordError> {
        self.hash(password).map(|_| ())
    }
}
