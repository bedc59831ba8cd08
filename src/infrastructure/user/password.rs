//! Password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version,
};
use std::fmt;

use crate::domain::DomainError;

/// One-way, salted password hashing
pub trait PasswordHasher: Send + Sync + fmt::Debug {
    /// Hash `password` with a fresh random salt into a PHC string
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Check `password` against a stored PHC string; malformed hashes never match
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id (v0x13) with the library's default cost. The cost is fixed at
/// construction and recorded in every produced hash.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("algorithm", &Algorithm::Argon2id)
            .finish()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| DomainError::internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        // Parameters come from the PHC string; the digest comparison is constant time
        PasswordHash::new(hash)
            .map(|phc| self.argon2.verify_password(password.as_bytes(), &phc).is_ok())
            .unwrap_or(false)
    }
}
