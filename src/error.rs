use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;

/// The main error type for Gatewick operations.
///
/// Login responses never distinguish "unknown account" from "wrong password";
/// both surface as [`GatewickError::Authentication`]. Lockout is the deliberate
/// exception: it is disclosed, with remaining time, so clients can back off.
#[derive(Debug, thiserror::Error)]
pub enum GatewickError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotActive,

    #[error("Subject unavailable")]
    SubjectUnavailable,

    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("Account temporarily locked, retry in {}s", .remaining.as_secs())]
    Locked { remaining: Duration },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Dependency failure: {0}")]
    Dependency(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_id: Option<String>,
    /// Present only on lockout responses; safe to disclose.
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

impl GatewickError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// The generic credentials error used for both unknown accounts and wrong
    /// passwords, to avoid account enumeration.
    pub fn invalid_credentials() -> Self {
        Self::Authentication("invalid credentials".into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidOrExpiredCode => StatusCode::BAD_REQUEST,
            Self::Authentication(_)
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::TokenNotActive
            | Self::SubjectUnavailable => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Locked { .. } => StatusCode::LOCKED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a message suitable for client responses in production.
    ///
    /// 4xx errors keep their message; 5xx errors collapse to a generic one so
    /// store/hashing internals never reach the caller (CWE-209). Full detail
    /// is still logged server-side.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Anyhow(_) => "Internal error".to_string(),
            Self::Dependency(_) => "Dependency failure".to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to a response, exposing full messages only when `dev_mode`.
    pub fn into_response_with_mode(self, dev_mode: bool) -> Response {
        let status = self.status_code();

        let error_msg = if dev_mode {
            self.to_string()
        } else {
            self.safe_message()
        };

        let retry_after_seconds = match &self {
            Self::Locked { remaining } => Some(remaining.as_secs()),
            _ => None,
        };

        let error_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Operation failed"
        );

        let body = Json(ErrorResponse {
            error: error_msg,
            error_id: Some(error_id),
            retry_after_seconds,
        });

        (status, body).into_response()
    }
}

impl IntoResponse for GatewickError {
    fn into_response(self) -> Response {
        self.into_response_with_mode(false)
    }
}

/// Result type alias for Gatewick operations.
pub type Result<T> = std::result::Result<T, GatewickError>;
