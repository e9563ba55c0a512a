//! Credential hashing.
//!
//! The user service never stores plain-text passwords. Hashing sits behind the
//! [`CredentialHasher`] trait so the algorithm can be swapped without touching
//! the service; [`Argon2Hasher`] is the default.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{DomainError, DomainResult};

/// Pluggable password hashing collaborator.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plain-text credential into a self-describing PHC string.
    fn hash(&self, plain_text: &str) -> DomainResult<String>;

    /// Check a plain-text credential against a stored hash.
    ///
    /// Malformed hashes never verify.
    fn verify(&self, plain_text: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::credential(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
