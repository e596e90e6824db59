//! Token verification flow.
//!
//! Signature/expiry/not-before checks come from the token authority; this
//! flow adds the checks that need the live account record: the subject must
//! exist and be active, and the token's `iat` must not predate the account's
//! `password_changed_at`; that comparison is what invalidates every
//! outstanding token on a password change, with no revocation list.

use crate::account::unix_secs;
use crate::error::{GatewickError, Result};
use crate::store::CredentialStore;
use crate::token::TokenAuthority;

use super::types::VerifiedSession;

/// Verifies bearer tokens against the live account state.
pub struct SessionVerifier<S: CredentialStore> {
    store: S,
    tokens: TokenAuthority,
}

impl<S: CredentialStore> SessionVerifier<S> {
    /// Create a new session verifier.
    pub fn new(store: S, tokens: TokenAuthority) -> Self {
        Self { store, tokens }
    }

    /// Verify a token and return the session, with an advisory replacement
    /// token when the presented one is inside its refresh window.
    pub async fn verify(&self, token: &str) -> Result<VerifiedSession> {
        let claims = self.tokens.verify(token)?;

        let account = match self.store.find_by_id(&claims.sub).await? {
            Some(account) if account.active => account,
            _ => return Err(GatewickError::SubjectUnavailable),
        };

        if let Some(changed_at) = account.password_changed_at {
            if claims.iat < unix_secs(changed_at) {
                tracing::info!(
                    target: "auth.token.stale",
                    account_id = %account.id,
                    "Token issued before last password change"
                );
                return Err(GatewickError::InvalidToken);
            }
        }

        let reissued = if self.tokens.needs_refresh(&claims) {
            Some(self.tokens.issue(&claims.sub)?)
        } else {
            None
        };

        Ok(VerifiedSession {
            subject_id: claims.sub.clone(),
            claims,
            reissued,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::store::InMemoryCredentialStore;
    use crate::token::TokenConfig;
    use std::time::{Duration, SystemTime};

    fn authority() -> TokenAuthority {
        TokenAuthority::new(TokenConfig::new("test-secret-key-32-bytes-long!!", "test-app"))
            .unwrap()
    }

    async fn seed(store: &InMemoryCredentialStore) -> Account {
        store
            .create(Account::new("alice", "alice@example.com", "$argon2id$stub", None))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_verify_live_subject() {
        let store = InMemoryCredentialStore::new();
        let account = seed(&store).await;
        let tokens = authority();
        let signed = tokens.issue(&account.id).unwrap();

        let verifier = SessionVerifier::new(store, tokens);
        let session = verifier.verify(&signed.token).await.unwrap();
        assert_eq!(session.subject_id, account.id);
        // A fresh token is nowhere near its refresh window.
        assert!(session.reissued.is_none());
    }

    #[tokio::test]
    async fn test_missing_subject_is_unavailable() {
        let store = InMemoryCredentialStore::new();
        let tokens = authority();
        let signed = tokens.issue("no-such-account").unwrap();

        let verifier = SessionVerifier::new(store, tokens);
        assert!(matches!(
            verifier.verify(&signed.token).await,
            Err(GatewickError::SubjectUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_deactivated_subject_is_unavailable() {
        let store = InMemoryCredentialStore::new();
        let mut account = seed(&store).await;
        let tokens = authority();
        let signed = tokens.issue(&account.id).unwrap();

        account.active = false;
        store.update(&account).await.unwrap();

        let verifier = SessionVerifier::new(store, tokens);
        assert!(matches!(
            verifier.verify(&signed.token).await,
            Err(GatewickError::SubjectUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_password_change_invalidates_prior_tokens() {
        let store = InMemoryCredentialStore::new();
        let account = seed(&store).await;
        let tokens = authority();
        let signed = tokens.issue(&account.id).unwrap();

        // Password changed after issuance (strictly later than iat).
        store
            .update_password(
                &account.id,
                "$argon2id$new",
                SystemTime::now() + Duration::from_secs(5),
            )
            .await
            .unwrap();

        let verifier = SessionVerifier::new(store, tokens);
        assert!(matches!(
            verifier.verify(&signed.token).await,
            Err(GatewickError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let store = InMemoryCredentialStore::new();
        seed(&store).await;
        let verifier = SessionVerifier::new(store, authority());
        assert!(matches!(
            verifier.verify("garbage").await,
            Err(GatewickError::InvalidToken)
        ));
    }
}
