//! In-memory credential store.
//!
//! Keeps every account under a single mutex, which trivially satisfies the
//! per-record atomicity the contract requires. Suitable for tests and small
//! single-process deployments; clones share the same underlying map.

use super::{CredentialStore, LockDecision};
use crate::account::Account;
use crate::error::{GatewickError, Result};
use crate::lockout::LockoutPolicy;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

/// In-memory [`CredentialStore`] backend.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
}

impl InMemoryCredentialStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().expect("credential store mutex poisoned")
    }

    fn mutate<F>(&self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| GatewickError::internal(format!("no account record for id {id}")))?;
        f(account);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.lock().get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = email.to_lowercase();
        Ok(self.lock().values().find(|a| a.email == email).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account> {
        let mut accounts = self.lock();
        if accounts.values().any(|a| a.username == account.username) {
            return Err(GatewickError::conflict("username already registered"));
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(GatewickError::conflict("email already registered"));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let mut accounts = self.lock();
        if !accounts.contains_key(&account.id) {
            return Err(GatewickError::internal(format!(
                "no account record for id {}",
                account.id
            )));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn record_failed_login(&self, id: &str, policy: &LockoutPolicy) -> Result<LockDecision> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| GatewickError::internal(format!("no account record for id {id}")))?;

        let now = SystemTime::now();
        match account.lock_expires_at {
            // Still locked: leave the record as-is.
            Some(until) if until > now => {
                return Ok(LockDecision {
                    attempts: account.failed_attempts,
                    locked: true,
                    lock_expires_at: Some(until),
                });
            }
            // Stale lock: this failure starts a fresh window.
            Some(_) => {
                account.failed_attempts = 0;
                account.lock_expires_at = None;
            }
            None => {}
        }

        account.failed_attempts += 1;
        if account.failed_attempts >= policy.max_attempts {
            let until = now + policy.lock_duration;
            account.lock_expires_at = Some(until);
            return Ok(LockDecision {
                attempts: account.failed_attempts,
                locked: true,
                lock_expires_at: Some(until),
            });
        }

        Ok(LockDecision {
            attempts: account.failed_attempts,
            locked: false,
            lock_expires_at: None,
        })
    }

    async fn clear_lockout(&self, id: &str) -> Result<()> {
        self.mutate(id, |account| {
            account.failed_attempts = 0;
            account.lock_expires_at = None;
        })
    }

    async fn record_login(&self, id: &str, now: SystemTime) -> Result<()> {
        self.mutate(id, |account| {
            account.failed_attempts = 0;
            account.lock_expires_at = None;
            account.last_login_at = Some(now);
        })
    }

    async fn set_reset_code(
        &self,
        id: &str,
        code_hash: &str,
        expires_at: SystemTime,
    ) -> Result<()> {
        self.mutate(id, |account| {
            account.reset_code_hash = Some(code_hash.to_string());
            account.reset_code_expires_at = Some(expires_at);
        })
    }

    async fn clear_reset_code(&self, id: &str) -> Result<()> {
        self.mutate(id, |account| {
            account.reset_code_hash = None;
            account.reset_code_expires_at = None;
        })
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        changed_at: SystemTime,
    ) -> Result<()> {
        self.mutate(id, |account| {
            account.password_hash = password_hash.to_string();
            account.password_changed_at = Some(changed_at);
            account.reset_code_hash = None;
            account.reset_code_expires_at = None;
        })
    }
}
