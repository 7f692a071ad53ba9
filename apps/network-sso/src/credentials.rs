//! Password hashing with Argon2id for the node's login form.
//!
//! Hashes are PHC strings; the same string is what the handshake derives
//! each user's signing secret from, so changing a password invalidates
//! every assertion still in flight for that user.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Salt and output of the throwaway hash checked for unknown login names
const DUMMY_SALT: &str = "c2FsdHNhbHQ";
const DUMMY_OUTPUT: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Credential errors
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id hasher with OWASP-recommended parameters
/// (19 MiB memory, 2 iterations, parallelism 1).
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    #[must_use]
    pub fn new() -> Self {
        // Constant parameters; failure would be a bug in the argon2 crate
        let params = Params::new(19456, 2, 1, None)
            .expect("OWASP 2024 Argon2 parameters are valid constants");

        Self { params }
    }

    /// Hasher with custom cost parameters.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, CredentialError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| CredentialError::HashingFailed(format!("Invalid parameters: {e}")))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailed(format!("Hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC hash.
    ///
    /// `Ok(false)` on a wrong password; `Err` only for an unparseable hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hash).map_err(|_| CredentialError::InvalidHashFormat)?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::HashingFailed(format!(
                "Verification failed: {e}"
            ))),
        }
    }
}

impl CredentialHasher {
    /// PHC string with this hasher's cost parameters that no password matches.
    fn dummy_hash(&self) -> String {
        format!(
            "$argon2id$v=19$m={},t={},p={}${DUMMY_SALT}${DUMMY_OUTPUT}",
            self.params.m_cost(),
            self.params.t_cost(),
            self.params.p_cost()
        )
    }

    /// Spends the same work as [`verify`](Self::verify) for a login name
    /// that has no account, so response time does not reveal which exist.
    pub fn verify_unknown_user(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash());
    }
}
