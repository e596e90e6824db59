//! Request and response types for the account security operations.

use crate::account::AccountProfile;
use crate::token::{Claims, SignedToken};
use serde::{Deserialize, Serialize};

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Login request. The identifier is a username or an email address.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Successful login: a bearer token plus the account's public view.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: SignedToken,
    pub account: AccountProfile,
}

/// Successful token verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedSession {
    pub subject_id: String,
    #[serde(skip)]
    pub claims: Claims,
    /// Advisory replacement token, minted when the presented token was
    /// inside its refresh window. The old token remains valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reissued: Option<SignedToken>,
}

/// Password reset request (step one of the recovery flow).
#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// Recovery-code check (optional step two).
#[derive(Debug, Clone, Deserialize)]
pub struct ResetVerifyRequest {
    pub email: String,
    pub code: String,
}

/// Password reset completion (final step).
#[derive(Debug, Clone, Deserialize)]
pub struct ResetCompleteRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Password change for an authenticated account.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account deactivation, confirmed with the current password.
#[derive(Debug, Clone, Deserialize)]
pub struct DeactivateRequest {
    pub password: String,
}
