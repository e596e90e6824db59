//! Soft account deactivation.
//!
//! Accounts are never hard-deleted. Deactivation flips the active flag and
//! defaces the username/email, which frees both identifiers for
//! re-registration while the record and its id stay put. Outstanding tokens
//! die at the next verification, which reports the subject unavailable.

use crate::error::{GatewickError, Result};
use crate::password::PasswordHasher;
use crate::store::CredentialStore;

use super::types::DeactivateRequest;

/// Handles soft deactivation.
pub struct DeactivationFlow<S: CredentialStore> {
    store: S,
    password_hasher: PasswordHasher,
}

impl<S: CredentialStore> DeactivationFlow<S> {
    /// Create a new deactivation flow.
    pub fn new(store: S) -> Self {
        Self {
            store,
            password_hasher: PasswordHasher::default(),
        }
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Deactivate an account, confirmed with its current password.
    ///
    /// Idempotent: an already-inactive account returns `Ok` without
    /// re-checking the password (the defaced record no longer carries one
    /// the caller could know).
    pub async fn deactivate(&self, account_id: &str, req: DeactivateRequest) -> Result<()> {
        let mut account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(GatewickError::SubjectUnavailable)?;

        if !account.active {
            return Ok(());
        }

        if !self
            .password_hasher
            .verify(&req.password, &account.password_hash)?
        {
            return Err(GatewickError::invalid_credentials());
        }

        account.deface();
        self.store.update(&account).await?;

        tracing::warn!(
            target: "auth.account.deactivated",
            account_id = %account.id,
            "Account deactivated and identifiers defaced"
        );
        Ok(())
    }
}
