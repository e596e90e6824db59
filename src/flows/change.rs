//! Password change flow for authenticated accounts.
//!
//! Unlike recovery (which authorizes with an emailed code), a change requires
//! the current password. Setting `password_changed_at` invalidates every
//! outstanding bearer token, so other sessions die with the old secret.
//!
//! This module emits tracing events for security monitoring:
//! - `auth.password.change_failed` - Wrong current password or weak new password
//! - `auth.password.changed` - Password changed successfully

use crate::error::{GatewickError, Result};
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::store::CredentialStore;
use std::time::SystemTime;

use super::types::PasswordChangeRequest;

/// Handles password change for authenticated accounts.
pub struct PasswordChangeFlow<S: CredentialStore> {
    store: S,
    password_hasher: PasswordHasher,
    password_policy: PasswordPolicy,
}

impl<S: CredentialStore> PasswordChangeFlow<S> {
    /// Create a new password change flow.
    pub fn new(store: S) -> Self {
        Self {
            store,
            password_hasher: PasswordHasher::default(),
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Set a custom password policy.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Change the password of an already-authenticated account.
    ///
    /// The caller supplies the account id from a verified session; this flow
    /// still demands the current password before mutating.
    pub async fn change_password(
        &self,
        account_id: &str,
        req: PasswordChangeRequest,
    ) -> Result<()> {
        let account = match self.store.find_by_id(account_id).await? {
            Some(account) if account.active => account,
            _ => return Err(GatewickError::SubjectUnavailable),
        };

        if !self
            .password_hasher
            .verify(&req.current_password, &account.password_hash)?
        {
            tracing::info!(
                target: "auth.password.change_failed",
                account_id = %account.id,
                reason = "wrong_current_password",
                "Password change rejected"
            );
            return Err(GatewickError::invalid_credentials());
        }

        self.password_policy.check(&req.new_password)?;

        let new_hash = self.password_hasher.hash(&req.new_password)?;
        self.store
            .update_password(&account.id, &new_hash, SystemTime::now())
            .await?;

        tracing::info!(
            target: "auth.password.changed",
            account_id = %account.id,
            "Password changed"
        );
        Ok(())
    }
}
