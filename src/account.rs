//! Account record and its public view.
//!
//! The [`Account`] struct is the persisted shape the credential store deals
//! in. Secret material (the password hash and the recovery-code hash) never
//! leaves the crate: the serializable outward view is [`AccountProfile`],
//! which is built without those fields.

use crate::lockout::LockState;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A stored account.
///
/// Accounts are never hard-deleted. Deactivation flips the `active` flag and
/// defaces `username`/`email` (see [`Account::deface`]) so the original
/// identifiers are freed for reuse while the record and its id survive.
#[derive(Clone, Debug)]
pub struct Account {
    /// Stable identifier (UUID v4).
    pub id: String,
    /// Unique username. Never contains `@`.
    pub username: String,
    /// Unique email, stored lowercase.
    pub email: String,
    /// Argon2id PHC digest of the password. Never serialized outward.
    pub password_hash: String,
    pub phone: Option<String>,
    pub active: bool,
    /// Consecutive failed login attempts since the last success or lock clear.
    pub failed_attempts: u32,
    /// When set and in the future, the account is locked. A value in the past
    /// means "unlocked" without requiring an explicit clear.
    pub lock_expires_at: Option<SystemTime>,
    /// Bearer tokens issued before this instant are invalid.
    pub password_changed_at: Option<SystemTime>,
    /// Argon2id PHC digest of the active recovery code, if any.
    pub reset_code_hash: Option<String>,
    pub reset_code_expires_at: Option<SystemTime>,
    pub last_login_at: Option<SystemTime>,
}

impl Account {
    /// Create a fresh, active account.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            phone,
            active: true,
            failed_attempts: 0,
            lock_expires_at: None,
            password_changed_at: None,
            reset_code_hash: None,
            reset_code_expires_at: None,
            last_login_at: None,
        }
    }

    /// Evaluate the lockout state of this account at `now`.
    ///
    /// Expiry is lazy: a lock whose expiry has passed reads as `Open` with a
    /// reset counter, without any background job having touched the record.
    #[must_use]
    pub fn lock_state(&self, now: SystemTime) -> LockState {
        LockState::of(self.failed_attempts, self.lock_expires_at, now)
    }

    /// Deface identifiers and deactivate.
    ///
    /// The replacement username/email are derived from the account id, so
    /// they remain unique and the originals become available for
    /// re-registration.
    pub fn deface(&mut self) {
        let tag = format!("deleted-{}", &self.id[..self.id.len().min(8)]);
        self.username = tag.clone();
        self.email = format!("{tag}@invalid.local");
        self.phone = None;
        self.active = false;
    }

    /// Build the outward-facing view of this account.
    #[must_use]
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            active: self.active,
            last_login_at: self.last_login_at.map(unix_secs),
        }
    }
}

/// Public JSON view of an account. Structurally free of secret material.
#[derive(Clone, Debug, Serialize)]
pub struct AccountProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub active: bool,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<u64>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        account.profile()
    }
}

/// Seconds since the unix epoch, saturating at zero for pre-epoch times.
pub(crate) fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
