//! Password hashing helpers built around Argon2id.
//!
//! One [`CredentialHasher`] is configured at startup and shared by the
//! account collection, so every stored password uses the same memory,
//! iteration, and parallelism parameters. The result is a PHC string
//! (`$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`) that carries its own salt
//! and parameters, so verification keeps working if the parameters change.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::error::PasswordError;

/// Argon2id hasher with a fixed work factor.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    /// Production parameters: 19 MiB of memory, 2 iterations, 1 lane.
    fn default() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }
}

impl CredentialHasher {
    /// Build a hasher with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Params`] if Argon2 rejects the combination
    /// (e.g. memory below `8 * parallelism` KiB).
    pub fn new(memory_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, time_cost, parallelism, None).map_err(|e| {
            PasswordError::Params {
                reason: e.to_string(),
            }
        })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// This is CPU-bound; async callers should run it on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Hash`] if Argon2 fails.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash {
                reason: e.to_string(),
            })?;
        Ok(hash.to_string())
    }

    /// Check a plaintext password against a stored PHC string.
    ///
    /// A malformed stored hash verifies as `false`.
    #[must_use]
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`hash`](Self::hash) on the Tokio blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Hash`] if Argon2 fails, or
    /// [`PasswordError::Task`] if the blocking task panics.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Task {
                reason: e.to_string(),
            })?
    }

    /// [`verify`](Self::verify) on the Tokio blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Task`] if the blocking task panics.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        stored_hash: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored_hash))
            .await
            .map_err(|e| PasswordError::Task {
                reason: e.to_string(),
            })
    }
}
