//! Login flow.
//!
//! The ordering here is the point: the lockout check happens before any
//! password hashing, so a locked account costs no Argon2 work and gives a
//! stable response regardless of the submitted password. Failure bookkeeping
//! goes through the store's atomic increment-and-maybe-lock.
//!
//! This module emits tracing events for security monitoring:
//! - `auth.lockout.blocked` - Attempt rejected while locked
//! - `auth.lockout.account_locked` - Attempt crossed the lock threshold
//! - `auth.login.failed` - Password mismatch below the threshold
//! - `auth.login.success` - Successful login

use crate::account::Account;
use crate::error::{GatewickError, Result};
use crate::lockout::{LockState, LockoutPolicy};
use crate::password::PasswordHasher;
use crate::store::CredentialStore;
use crate::token::TokenAuthority;
use std::time::SystemTime;

use super::types::{LoginOutcome, LoginRequest};

/// Handles login: lockout check, password verification, token issuance.
pub struct LoginFlow<S: CredentialStore> {
    store: S,
    tokens: TokenAuthority,
    password_hasher: PasswordHasher,
    lockout: LockoutPolicy,
}

impl<S: CredentialStore> LoginFlow<S> {
    /// Create a new login flow.
    pub fn new(store: S, tokens: TokenAuthority) -> Self {
        Self {
            store,
            tokens,
            password_hasher: PasswordHasher::default(),
            lockout: LockoutPolicy::default(),
        }
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Set a custom lockout policy.
    pub fn with_lockout(mut self, policy: LockoutPolicy) -> Self {
        self.lockout = policy;
        self
    }

    /// Attempt a login.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome> {
        let Some(mut account) = self.lookup(&req.identifier).await? else {
            // Timing-safe: burn a hash so unknown identifiers cost the same
            // as wrong passwords.
            let _ = self.password_hasher.hash("gatewick-timing-pad");
            return Err(GatewickError::invalid_credentials());
        };

        if !account.active {
            return Err(GatewickError::authorization("account deactivated"));
        }

        let now = SystemTime::now();
        if let LockState::Locked { until } = account.lock_state(now) {
            let remaining = until.duration_since(now).unwrap_or_default();
            tracing::info!(
                target: "auth.lockout.blocked",
                account_id = %account.id,
                remaining_seconds = remaining.as_secs(),
                "Login attempt blocked by lockout"
            );
            return Err(GatewickError::Locked { remaining });
        }

        if !self
            .password_hasher
            .verify(&req.password, &account.password_hash)?
        {
            let decision = self
                .store
                .record_failed_login(&account.id, &self.lockout)
                .await?;

            if decision.locked {
                let until = decision.lock_expires_at.unwrap_or(now);
                tracing::warn!(
                    target: "auth.lockout.account_locked",
                    account_id = %account.id,
                    attempts = decision.attempts,
                    lock_seconds = self.lockout.lock_duration.as_secs(),
                    "Account locked due to failed attempts"
                );
                return Err(GatewickError::Locked {
                    remaining: until.duration_since(now).unwrap_or_default(),
                });
            }

            tracing::info!(
                target: "auth.login.failed",
                account_id = %account.id,
                attempts = decision.attempts,
                "Login failed: password mismatch"
            );
            return Err(GatewickError::invalid_credentials());
        }

        // Transparent hash upgrade when parameters have changed. Does not
        // touch password_changed_at: the secret itself is unchanged, so
        // outstanding tokens must survive.
        if self.password_hasher.needs_rehash(&account.password_hash)? {
            account.password_hash = self.password_hasher.hash(&req.password)?;
            self.store.update(&account).await?;
        }

        self.store.record_login(&account.id, now).await?;
        account.failed_attempts = 0;
        account.lock_expires_at = None;
        account.last_login_at = Some(now);

        let token = self.tokens.issue(&account.id)?;

        tracing::info!(
            target: "auth.login.success",
            account_id = %account.id,
            "Login succeeded"
        );

        Ok(LoginOutcome {
            token,
            account: account.profile(),
        })
    }

    /// Resolve an identifier to an account: emails carry '@', usernames
    /// never do (enforced at registration).
    async fn lookup(&self, identifier: &str) -> Result<Option<Account>> {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            self.store.find_by_email(&identifier.to_lowercase()).await
        } else {
            self.store.find_by_username(identifier).await
        }
    }
}
