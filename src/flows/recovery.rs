//! Password recovery flow.
//!
//! A 6-digit one-time code travels out-of-band via the mailer; only its
//! salted Argon2id hash and an expiry ever touch the store. Issuing a new
//! code supersedes any prior one, a delivery failure rolls the stored code
//! back, and exactly one password mutation can consume a given code.
//!
//! This module emits tracing events for security monitoring:
//! - `auth.recovery.requested` - Code requested (whether or not the account exists)
//! - `auth.recovery.delivery_failed` - Notifier failure, stored code rolled back
//! - `auth.recovery.verified` - Candidate code accepted
//! - `auth.recovery.completed` - Password reset completed

use crate::account::Account;
use crate::error::{GatewickError, Result};
use crate::mailer::{Email, Mailer};
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::store::CredentialStore;
use rand::Rng;
use std::time::{Duration, SystemTime};

use super::types::{ResetCompleteRequest, ResetRequest, ResetVerifyRequest};

/// Default recovery-code lifetime (10 minutes).
const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Handles the password recovery lifecycle.
///
/// Code guesses are bounded only by the 10-minute expiry and supersession;
/// the login lockout counter does not cover them.
pub struct RecoveryFlow<S: CredentialStore, M: Mailer> {
    store: S,
    mailer: M,
    password_hasher: PasswordHasher,
    password_policy: PasswordPolicy,
    code_ttl: Duration,
    sender: String,
}

impl<S: CredentialStore, M: Mailer> RecoveryFlow<S, M> {
    /// Create a new recovery flow.
    pub fn new(store: S, mailer: M) -> Self {
        Self {
            store,
            mailer,
            password_hasher: PasswordHasher::default(),
            password_policy: PasswordPolicy::default(),
            code_ttl: DEFAULT_CODE_TTL,
            sender: "no-reply@gatewick.local".to_string(),
        }
    }

    /// Set the code lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
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

    /// Set the sender address for recovery messages.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Request a recovery code.
    ///
    /// Returns the identical success for unknown and inactive accounts, so
    /// the response never reveals whether an email is registered. A delivery
    /// failure is reported distinctly; by then the caller has already
    /// proven nothing beyond what the registration conflict check reveals.
    pub async fn request_code(&self, req: ResetRequest) -> Result<()> {
        let email = req.email.trim().to_lowercase();

        let account = match self.store.find_by_email(&email).await? {
            Some(account) if account.active => account,
            _ => {
                tracing::info!(
                    target: "auth.recovery.requested",
                    subject_found = false,
                    "Recovery code requested for unknown or inactive account"
                );
                return Ok(());
            }
        };

        let code = generate_code();
        let code_hash = self.password_hasher.hash(&code)?;
        let expires_at = SystemTime::now() + self.code_ttl;

        // Supersedes any prior code in one record update.
        self.store
            .set_reset_code(&account.id, &code_hash, expires_at)
            .await?;

        let message = Email::new(&self.sender, &account.email, "Your password reset code").text(
            format!(
                "Your password reset code is {code}. It expires in {} minutes.\n\
                 If you did not request a password reset, you can ignore this message.",
                self.code_ttl.as_secs() / 60
            ),
        );

        if let Err(err) = self.mailer.send(&message).await {
            // Roll back so the user can retry immediately instead of
            // waiting out an unreachable code.
            self.store.clear_reset_code(&account.id).await?;
            tracing::warn!(
                target: "auth.recovery.delivery_failed",
                account_id = %account.id,
                error = %err,
                "Recovery code delivery failed, stored code rolled back"
            );
            return Err(GatewickError::dependency(format!(
                "recovery code delivery failed: {err}"
            )));
        }

        tracing::info!(
            target: "auth.recovery.requested",
            subject_found = true,
            account_id = %account.id,
            expires_in_secs = self.code_ttl.as_secs(),
            "Recovery code issued and delivered"
        );

        Ok(())
    }

    /// Check a candidate code without consuming it.
    pub async fn verify_code(&self, req: ResetVerifyRequest) -> Result<()> {
        let account = self.lookup(&req.email).await?;
        self.check_code(&account, &req.code)?;

        tracing::info!(
            target: "auth.recovery.verified",
            account_id = %account.id,
            "Recovery code verified"
        );
        Ok(())
    }

    /// Complete the reset: consume the code and install the new password.
    ///
    /// The store clears the code fields inside the same record update that
    /// swaps the hash, so a given code authorizes at most one mutation.
    /// Setting `password_changed_at` invalidates every outstanding bearer
    /// token.
    pub async fn reset_password(&self, req: ResetCompleteRequest) -> Result<()> {
        self.password_policy.check(&req.new_password)?;

        let account = self.lookup(&req.email).await?;
        self.check_code(&account, &req.code)?;

        let new_hash = self.password_hasher.hash(&req.new_password)?;
        self.store
            .update_password(&account.id, &new_hash, SystemTime::now())
            .await?;

        tracing::info!(
            target: "auth.recovery.completed",
            account_id = %account.id,
            "Password reset completed"
        );
        Ok(())
    }

    /// Resolve the account for a verification step. Unknown and inactive
    /// accounts collapse into the same error as a wrong code.
    async fn lookup(&self, email: &str) -> Result<Account> {
        let email = email.trim().to_lowercase();
        match self.store.find_by_email(&email).await? {
            Some(account) if account.active => Ok(account),
            _ => Err(GatewickError::InvalidOrExpiredCode),
        }
    }

    fn check_code(&self, account: &Account, code: &str) -> Result<()> {
        let (Some(hash), Some(expires_at)) =
            (&account.reset_code_hash, account.reset_code_expires_at)
        else {
            return Err(GatewickError::InvalidOrExpiredCode);
        };

        if expires_at <= SystemTime::now() {
            return Err(GatewickError::InvalidOrExpiredCode);
        }

        if !self.password_hasher.verify(code.trim(), hash)? {
            return Err(GatewickError::InvalidOrExpiredCode);
        }

        Ok(())
    }
}

/// Generate a 6-digit zero-padded code from the OS RNG.
fn generate_code() -> String {
    let n = rand::rngs::OsRng.gen_range(0..1_000_000u32);
    format!("{n:06}")
}
