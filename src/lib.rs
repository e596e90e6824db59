//! Gatewick - a credential and session authority
//!
//! Gatewick issues and verifies bearer tokens, protects accounts against
//! brute-force guessing with a per-account lockout, and runs an OTP-based
//! password-recovery flow. Storage and mail delivery stay behind traits, so
//! it plugs into whatever database and mail provider the surrounding
//! application already has.
//!
//! # Features
//!
//! - **Tokens**: self-contained HS256 bearer tokens with advisory sliding
//!   reissue; password changes invalidate outstanding tokens without a
//!   revocation list
//! - **Lockout**: five failed attempts lock an account for ten minutes,
//!   evaluated lazily with no background jobs
//! - **Recovery**: 6-digit one-time codes, stored hashed, single-use,
//!   superseded on reissue
//! - **Hashing**: Argon2id for passwords and recovery codes alike
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gatewick::{
//!     InMemoryCredentialStore, LoginFlow, LoginRequest, RegistrationFlow,
//!     RegisterRequest, TokenAuthority, TokenConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> gatewick::Result<()> {
//!     gatewick::init_tracing();
//!
//!     let store = InMemoryCredentialStore::new();
//!     let tokens = TokenAuthority::new(TokenConfig::from_env()?)?;
//!
//!     let registration = RegistrationFlow::new(store.clone());
//!     registration
//!         .register(RegisterRequest {
//!             username: "alice".into(),
//!             email: "alice@example.com".into(),
//!             password: "correct-horse-battery-staple".into(),
//!             phone: None,
//!         })
//!         .await?;
//!
//!     let login = LoginFlow::new(store, tokens);
//!     let outcome = login
//!         .login(LoginRequest {
//!             identifier: "alice".into(),
//!             password: "correct-horse-battery-staple".into(),
//!         })
//!         .await?;
//!     println!("token: {}", outcome.token.token);
//!     Ok(())
//! }
//! ```

pub mod account;
mod error;
pub mod flows;
pub mod lockout;
pub mod mailer;
pub mod password;
pub mod store;
pub mod token;

// Re-exports for public API
pub use account::{Account, AccountProfile};
pub use error::{ErrorResponse, GatewickError, Result};
pub use flows::{
    DeactivateRequest, DeactivationFlow, LoginFlow, LoginOutcome, LoginRequest,
    PasswordChangeFlow, PasswordChangeRequest, RecoveryFlow, RegisterRequest, RegistrationFlow,
    ResetCompleteRequest, ResetRequest, ResetVerifyRequest, SessionVerifier, VerifiedSession,
};
pub use lockout::{LockState, LockoutPolicy, LockoutStatus};
pub use mailer::{ConsoleMailer, Email, Mailer, SmtpConfig, SmtpMailer};
pub use password::{PasswordConfig, PasswordHasher, PasswordPolicy};
pub use store::{CredentialStore, InMemoryCredentialStore, LockDecision};
pub use token::{Claims, SignedToken, TokenAuthority, TokenConfig};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "gatewick=debug")
/// - `GATEWICK_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// use gatewick;
///
/// #[tokio::main]
/// async fn main() {
///     gatewick::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("GATEWICK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
