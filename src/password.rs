//! Password hashing and validation.
//!
//! Secure password hashing with Argon2id. The same hasher is used for login
//! secrets and for recovery codes, so both are stored as salted PHC strings.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatewick::{PasswordHasher, PasswordPolicy};
//!
//! let hasher = PasswordHasher::default();
//! let digest = hasher.hash("my-secure-password")?;
//! let valid = hasher.verify("my-secure-password", &digest)?;
//!
//! let policy = PasswordPolicy::default();
//! policy.check("short")?; // Returns a field-scoped validation error
//! ```

use crate::error::{GatewickError, Result};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Configuration for password hashing.
#[derive(Clone, Debug)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Create a new password config with custom settings.
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Faster settings for development/testing (NOT for production).
    #[cfg(any(test, debug_assertions))]
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Handles password hashing and verification using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

impl PasswordHasher {
    /// Create a new password hasher with the given configuration.
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a secret using Argon2id.
    ///
    /// Returns the PHC-formatted hash string (algorithm, params, salt, and
    /// hash). The salt is random per call, so two hashes of the same input
    /// differ.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = self.build_argon2()?;

        argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| GatewickError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a secret against a stored hash.
    ///
    /// Argon2 verification is constant-time regardless of where a mismatch
    /// occurs.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| GatewickError::internal(format!("Invalid password hash format: {e}")))?;

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Check if a hash needs to be rehashed (params changed).
    ///
    /// Call this on successful login to transparently upgrade old hashes.
    pub fn needs_rehash(&self, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| GatewickError::internal(format!("Invalid hash format: {e}")))?;

        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return Ok(true);
        }

        if let (Some(m), Some(t), Some(p)) = (
            parsed.params.get("m"),
            parsed.params.get("t"),
            parsed.params.get("p"),
        ) {
            let m: u32 = m.decimal().unwrap_or(0);
            let t: u32 = t.decimal().unwrap_or(0);
            let p: u32 = p.decimal().unwrap_or(0);

            Ok(m != self.config.memory_cost
                || t != self.config.time_cost
                || p != self.config.parallelism)
        } else {
            Ok(true)
        }
    }

    fn build_argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None,
        )
        .map_err(|e| GatewickError::internal(format!("Invalid Argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Password validation policy.
///
/// Deliberately length-only: a minimum plus a maximum as a DoS guard.
#[derive(Clone, Debug)]
pub struct PasswordPolicy {
    /// Minimum length (default: 8)
    pub min_length: usize,
    /// Maximum length (default: 128, prevents hashing DoS)
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    /// Create a policy with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum password length.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Set maximum password length.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Check if a password satisfies the policy.
    pub fn is_valid(&self, password: &str) -> bool {
        let len = password.chars().count();
        len >= self.min_length && len <= self.max_length
    }

    /// Validate, returning a field-scoped error on violation.
    pub fn check(&self, password: &str) -> Result<()> {
        let len = password.chars().count();
        if len < self.min_length {
            return Err(GatewickError::validation(
                "password",
                format!("must be at least {} characters", self.min_length),
            ));
        }
        if len > self.max_length {
            return Err(GatewickError::validation(
                "password",
                format!("must be at most {} characters", self.max_length),
            ));
        }
        Ok(())
    }
}
