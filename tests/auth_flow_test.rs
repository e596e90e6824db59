//! Integration tests for the account security state machine.
//!
//! These exercise the complete lifecycle over the in-memory store: register,
//! lock out, recover, and verify tokens across password changes.

use async_trait::async_trait;
use gatewick::{
    Account, CredentialStore, DeactivateRequest, DeactivationFlow, Email, GatewickError,
    InMemoryCredentialStore,
    LockoutPolicy, LoginFlow, LoginRequest, Mailer, PasswordConfig, PasswordHasher, RecoveryFlow,
    RegisterRequest, RegistrationFlow, ResetCompleteRequest, ResetRequest, ResetVerifyRequest,
    Result, SessionVerifier, TokenAuthority, TokenConfig,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

// =============================================================================
// Fixtures
// =============================================================================

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(PasswordConfig::fast())
}

fn authority() -> TokenAuthority {
    TokenAuthority::new(TokenConfig::new(
        "integration-secret-32-bytes-long!",
        "gatewick-test",
    ))
    .unwrap()
}

/// Mailer that records every message so tests can read the delivered code.
#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl RecordingMailer {
    fn new() -> Self {
        Self::default()
    }

    fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let text = &sent.last().expect("no mail delivered").text;
        text.chars().filter(|c| c.is_ascii_digit()).take(6).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

struct Harness {
    store: InMemoryCredentialStore,
    mailer: RecordingMailer,
    registration: RegistrationFlow<InMemoryCredentialStore>,
    login: LoginFlow<InMemoryCredentialStore>,
    verifier: SessionVerifier<InMemoryCredentialStore>,
    recovery: RecoveryFlow<InMemoryCredentialStore, RecordingMailer>,
}

fn harness() -> Harness {
    let store = InMemoryCredentialStore::new();
    let mailer = RecordingMailer::new();
    Harness {
        registration: RegistrationFlow::new(store.clone()).with_hasher(fast_hasher()),
        login: LoginFlow::new(store.clone(), authority()).with_hasher(fast_hasher()),
        verifier: SessionVerifier::new(store.clone(), authority()),
        recovery: RecoveryFlow::new(store.clone(), mailer.clone()).with_hasher(fast_hasher()),
        store,
        mailer,
    }
}

fn register_req(username: &str, email: &str, password: &str, phone: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        phone: Some(phone.to_string()),
    }
}

fn login_req(identifier: &str, password: &str) -> LoginRequest {
    LoginRequest {
        identifier: identifier.to_string(),
        password: password.to_string(),
    }
}

async fn register_alice(h: &Harness) -> Account {
    h.registration
        .register(register_req(
            "alice",
            "alice@x.com",
            "secret-password-1",
            "1234567890",
        ))
        .await
        .unwrap()
}

// =============================================================================
// Registration and lockout scenario
// =============================================================================

#[tokio::test]
async fn test_register_login_lockout_scenario() {
    let h = harness();

    let account = register_alice(&h).await;
    assert_eq!(account.username, "alice");
    assert_eq!(account.email, "alice@x.com");

    // Same email again fails with a duplicate-email conflict.
    let err = h
        .registration
        .register(register_req("bob", "alice@x.com", "secret-password-2", "2"))
        .await
        .unwrap_err();
    assert!(matches!(&err, GatewickError::Conflict(m) if m.contains("email")));

    // Five wrong passwords lock the account.
    for attempt in 1..=5 {
        let err = h.login.login(login_req("alice", "wrong")).await.unwrap_err();
        if attempt < 5 {
            assert!(matches!(err, GatewickError::Authentication(_)));
        } else {
            assert!(matches!(err, GatewickError::Locked { .. }));
        }
    }

    // The correct password during the lock is rejected with remaining time.
    let err = h
        .login
        .login(login_req("alice", "secret-password-1"))
        .await
        .unwrap_err();
    let remaining = match err {
        GatewickError::Locked { remaining } => remaining,
        other => panic!("expected lockout, got {other:?}"),
    };
    assert!(remaining.as_secs() > 0);
    assert!(remaining <= Duration::from_secs(10 * 60));

    // Once the lock expires, the same attempt is evaluated as if unlocked.
    let mut stored = h.store.find_by_id(&account.id).await.unwrap().unwrap();
    stored.lock_expires_at = Some(SystemTime::now() - Duration::from_secs(1));
    h.store.update(&stored).await.unwrap();

    let outcome = h
        .login
        .login(login_req("alice", "secret-password-1"))
        .await
        .unwrap();
    assert_eq!(outcome.account.id, account.id);

    let stored = h.store.find_by_id(&account.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_attempts, 0);
    assert!(stored.lock_expires_at.is_none());
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_lockout_policy_is_configurable() {
    let store = InMemoryCredentialStore::new();
    let registration = RegistrationFlow::new(store.clone()).with_hasher(fast_hasher());
    registration
        .register(register_req("carol", "carol@x.com", "secret-password-1", "3"))
        .await
        .unwrap();

    let login = LoginFlow::new(store, authority())
        .with_hasher(fast_hasher())
        .with_lockout(LockoutPolicy::new().max_attempts(2).lock_duration(Duration::from_secs(60)));

    login.login(login_req("carol", "wrong")).await.unwrap_err();
    let err = login.login(login_req("carol", "wrong")).await.unwrap_err();
    let GatewickError::Locked { remaining } = err else {
        panic!("expected lockout after two attempts");
    };
    assert!(remaining <= Duration::from_secs(60));
}

// =============================================================================
// Token verification
// =============================================================================

#[tokio::test]
async fn test_token_round_trip_and_subject_checks() {
    let h = harness();
    let account = register_alice(&h).await;

    let outcome = h
        .login
        .login(login_req("alice@x.com", "secret-password-1"))
        .await
        .unwrap();

    let session = h.verifier.verify(&outcome.token.token).await.unwrap();
    assert_eq!(session.subject_id, account.id);
    assert!(session.reissued.is_none());

    // Deactivation makes the subject unavailable at verify time.
    let deactivation = DeactivationFlow::new(h.store.clone()).with_hasher(fast_hasher());
    deactivation
        .deactivate(
            &account.id,
            DeactivateRequest {
                password: "secret-password-1".to_string(),
            },
        )
        .await
        .unwrap();

    let err = h.verifier.verify(&outcome.token.token).await.unwrap_err();
    assert!(matches!(err, GatewickError::SubjectUnavailable));

    // The defaced identifiers are free for a fresh registration.
    let again = register_alice(&h).await;
    assert_ne!(again.id, account.id);
}

#[tokio::test]
async fn test_password_reset_invalidates_outstanding_tokens() {
    let h = harness();
    register_alice(&h).await;

    let outcome = h
        .login
        .login(login_req("alice", "secret-password-1"))
        .await
        .unwrap();
    h.verifier.verify(&outcome.token.token).await.unwrap();

    // Cross a second boundary so password_changed_at lands strictly after iat.
    tokio::time::sleep(Duration::from_millis(1100)).await;

    h.recovery
        .request_code(ResetRequest {
            email: "alice@x.com".to_string(),
        })
        .await
        .unwrap();
    let code = h.mailer.last_code();
    h.recovery
        .reset_password(ResetCompleteRequest {
            email: "alice@x.com".to_string(),
            code,
            new_password: "fresh-password-2".to_string(),
        })
        .await
        .unwrap();

    let err = h.verifier.verify(&outcome.token.token).await.unwrap_err();
    assert!(matches!(err, GatewickError::InvalidToken));

    // The new password works; the old one does not.
    h.login
        .login(login_req("alice", "fresh-password-2"))
        .await
        .unwrap();
    let err = h
        .login
        .login(login_req("alice", "secret-password-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewickError::Authentication(_)));
}

// =============================================================================
// Recovery flow
// =============================================================================

#[tokio::test]
async fn test_recovery_anti_enumeration_and_single_use() {
    let h = harness();
    register_alice(&h).await;

    // Unknown email gets the identical success shape.
    let unknown = h
        .recovery
        .request_code(ResetRequest {
            email: "ghost@x.com".to_string(),
        })
        .await;
    assert!(unknown.is_ok());
    assert!(h.mailer.sent.lock().unwrap().is_empty());

    h.recovery
        .request_code(ResetRequest {
            email: "alice@x.com".to_string(),
        })
        .await
        .unwrap();
    let code = h.mailer.last_code();
    assert_eq!(code.len(), 6);

    // Verify does not consume; the reset does.
    h.recovery
        .verify_code(ResetVerifyRequest {
            email: "alice@x.com".to_string(),
            code: code.clone(),
        })
        .await
        .unwrap();
    h.recovery
        .reset_password(ResetCompleteRequest {
            email: "alice@x.com".to_string(),
            code: code.clone(),
            new_password: "fresh-password-2".to_string(),
        })
        .await
        .unwrap();

    let replay = h
        .recovery
        .verify_code(ResetVerifyRequest {
            email: "alice@x.com".to_string(),
            code,
        })
        .await;
    assert!(matches!(replay, Err(GatewickError::InvalidOrExpiredCode)));
}

#[tokio::test]
async fn test_secret_material_stays_internal() {
    let h = harness();
    let account = register_alice(&h).await;

    let outcome = h
        .login
        .login(login_req("alice", "secret-password-1"))
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["account"].get("password_hash").is_none());
    assert!(json["account"].get("reset_code_hash").is_none());
    assert_eq!(json["account"]["id"], serde_json::json!(account.id));
    assert!(json["token"]["token"].as_str().is_some());
}
