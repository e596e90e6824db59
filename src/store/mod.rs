//! Credential store contract.
//!
//! The store is the only place per-account state lives; every operation the
//! flows need is a single keyed record read or mutation. Implement
//! [`CredentialStore`] for your database layer. The mutating operations that
//! back the lockout guard and the recovery flow must be atomic per record:
//! `record_failed_login` is an increment-and-maybe-lock, and the reset-code
//! operations supersede in place, so no application-level read-modify-write
//! can lose an update under concurrent requests for the same account.

pub mod memory;

pub use memory::InMemoryCredentialStore;

use crate::account::Account;
use crate::error::Result;
use crate::lockout::LockoutPolicy;
use async_trait::async_trait;
use std::time::SystemTime;

/// Result of the atomic failed-login recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockDecision {
    /// Failed-attempt count after this recording.
    pub attempts: u32,
    /// Whether the account is locked after this recording.
    pub locked: bool,
    /// Lock expiry, when locked.
    pub lock_expires_at: Option<SystemTime>,
}

/// Durable keyed storage of [`Account`] records.
///
/// # Example
///
/// ```rust,ignore
/// use gatewick::store::CredentialStore;
/// use async_trait::async_trait;
///
/// struct PgCredentialStore {
///     pool: PgPool,
/// }
///
/// #[async_trait]
/// impl CredentialStore for PgCredentialStore {
///     async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
///         // Query your database
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by its stable id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>>;

    /// Find an account by username (exact match).
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Find an account by email (case-insensitive; emails are stored lowercase).
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Persist a new account.
    ///
    /// Returns `Error::Conflict` if the username or email is already taken.
    async fn create(&self, account: Account) -> Result<Account>;

    /// Overwrite an existing account record.
    async fn update(&self, account: &Account) -> Result<()>;

    /// Atomically record a failed login attempt.
    ///
    /// Increments the counter and, when it reaches `policy.max_attempts`,
    /// sets the lock expiry in the same mutation. A stale (expired) lock on
    /// the record is cleared first, so the attempt counts as the first of a
    /// fresh window. Called only when the account was observed unlocked; a
    /// record that is still locked is returned unchanged.
    async fn record_failed_login(&self, id: &str, policy: &LockoutPolicy) -> Result<LockDecision>;

    /// Clear the attempt counter and any lock expiry.
    async fn clear_lockout(&self, id: &str) -> Result<()>;

    /// Record a successful login: set last-login, clear the attempt counter
    /// and any lock expiry in one mutation.
    async fn record_login(&self, id: &str, now: SystemTime) -> Result<()>;

    /// Store a recovery-code hash and expiry, superseding any prior code.
    async fn set_reset_code(
        &self,
        id: &str,
        code_hash: &str,
        expires_at: SystemTime,
    ) -> Result<()>;

    /// Remove any stored recovery code (rollback or consumption).
    async fn clear_reset_code(&self, id: &str) -> Result<()>;

    /// Swap the password hash, set `password_changed_at`, and clear any
    /// stored recovery code, all in one mutation. A password mutation must
    /// consume whatever code authorized it, and clearing in the same record
    /// update keeps that single-use guarantee under concurrency.
    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        changed_at: SystemTime,
    ) -> Result<()>;
}
