//! Registration flow.

use crate::account::Account;
use crate::error::{GatewickError, Result};
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::store::CredentialStore;

use super::types::RegisterRequest;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 64;

/// Handles account registration.
pub struct RegistrationFlow<S: CredentialStore> {
    store: S,
    password_hasher: PasswordHasher,
    password_policy: PasswordPolicy,
}

impl<S: CredentialStore> RegistrationFlow<S> {
    /// Create a new registration flow.
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

    /// Register a new account.
    ///
    /// Duplicate username and duplicate email are distinct conflicts: unlike
    /// login, registration necessarily reveals identifier availability.
    pub async fn register(&self, req: RegisterRequest) -> Result<Account> {
        let email = req.email.trim().to_lowercase();
        let username = req.username.trim().to_string();

        if !is_valid_email(&email) {
            return Err(GatewickError::validation("email", "invalid email format"));
        }

        // Usernames must not look like emails: login routes identifiers
        // containing '@' to the email lookup.
        if username.is_empty() || username.len() > MAX_USERNAME_LENGTH || username.contains('@') {
            return Err(GatewickError::validation(
                "username",
                format!("must be 1-{MAX_USERNAME_LENGTH} characters without '@'"),
            ));
        }

        self.password_policy.check(&req.password)?;

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(GatewickError::conflict("username already registered"));
        }
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(GatewickError::conflict("email already registered"));
        }

        let hash = self.password_hasher.hash(&req.password)?;

        // The store re-checks uniqueness; a concurrent registration still
        // surfaces as a conflict rather than a duplicate record.
        let account = self
            .store
            .create(Account::new(username, email, hash, req.phone))
            .await?;

        tracing::info!(
            target: "auth.register.created",
            account_id = %account.id,
            "Account registered"
        );

        Ok(account)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::PasswordConfig;
    use crate::store::InMemoryCredentialStore;

    fn test_flow() -> RegistrationFlow<InMemoryCredentialStore> {
        RegistrationFlow::new(InMemoryCredentialStore::new())
            .with_hasher(PasswordHasher::new(PasswordConfig::fast()))
    }

    fn request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret-password".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let flow = test_flow();
        let account = flow
            .register(request("alice", "Alice@Example.COM"))
            .await
            .unwrap();
        assert_eq!(account.email, "alice@example.com");
        assert!(account.active);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let flow = test_flow();
        let mut req = request("alice", "alice@example.com");
        req.password = "short".to_string();

        let err = flow.register(req).await.unwrap_err();
        assert!(matches!(err, GatewickError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_email_shaped_username() {
        let flow = test_flow();
        let err = flow
            .register(request("alice@example.com", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewickError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_are_distinct() {
        let flow = test_flow();
        flow.register(request("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = flow
            .register(request("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("username"));

        let err = flow
            .register(request("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
