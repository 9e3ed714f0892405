//! Password hashing service
//!
//! Argon2id with PHC string output. The hasher is an explicitly
//! constructed value passed into [`crate::service::FormService`], with
//! algorithm cost factors set at construction time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Password hashing failures
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    /// Rejected cost parameters
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Hashing a new password failed
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash could not be parsed
    #[error("stored password hash is malformed: {0}")]
    InvalidHash(String),

    /// Verification failed for a reason other than a mismatch
    #[error("password verification failed: {0}")]
    VerificationFailed(String),
}

/// Cost factors for Argon2id
#[derive(Debug, Clone, Copy)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Iteration count
    pub iterations: u32,
    /// Parallelism degree
    pub parallelism: u32,
}

impl Default for HashingConfig {
    /// OWASP-recommended Argon2id parameters: 19 MiB, 2 iterations, 1 lane
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Argon2id password hasher
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher {
    /// Build a hasher with explicit cost factors
    pub fn new(config: HashingConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password, returning the PHC string
    /// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC string.
    ///
    /// Returns `Ok(false)` on mismatch; the comparison is constant-time.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low-cost parameters keep the tests quick.
    fn test_hasher() -> PasswordHasher {
        PasswordHasher::new(HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hasher = test_hasher();
        let hash = hasher.hash("pw").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("pw", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = test_hasher();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = test_hasher();
        let err = hasher.verify("pw", "plaintext-from-an-old-row").unwrap_err();
        assert!(matches!(err, PasswordError::InvalidHash(_)));
    }
}
