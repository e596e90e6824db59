//! Out-of-band notification delivery.
//!
//! The recovery flow only needs a deliver-or-fail contract; everything else
//! about email is someone else's problem. Messages are plain text: recovery
//! codes need no markup. Backends:
//! - [`ConsoleMailer`] - prints to stdout (development)
//! - [`SmtpMailer`] - sends via SMTP using lettre

mod console;
mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use crate::error::{GatewickError, Result};
use async_trait::async_trait;

/// A plain-text message to be delivered.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address (e.g., "no-reply@example.com")
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
}

impl Email {
    /// Create a new message.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: String::new(),
        }
    }

    /// Set the body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = body.into();
        self
    }

    /// Validate the message has the required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(GatewickError::validation("from", "sender address is required"));
        }
        if self.to.is_empty() {
            return Err(GatewickError::validation("to", "recipient address is required"));
        }
        if self.subject.is_empty() {
            return Err(GatewickError::validation("subject", "subject is required"));
        }
        if self.text.is_empty() {
            return Err(GatewickError::validation("text", "body is required"));
        }
        Ok(())
    }
}

/// Delivery contract consumed by the recovery flow.
///
/// Errors are opaque to the caller beyond success/failure; a failed delivery
/// surfaces as [`GatewickError::Dependency`] and is never retried inside the
/// core (a silent retry could double-send a code).
///
/// # Example
///
/// ```rust,ignore
/// use gatewick::mailer::{Mailer, Email};
/// use gatewick::Result;
/// use async_trait::async_trait;
///
/// struct MyMailer;
///
/// #[async_trait]
/// impl Mailer for MyMailer {
///     async fn send(&self, email: &Email) -> Result<()> {
///         // Deliver via your preferred service
///         Ok(())
///     }
///
///     fn is_healthy(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message. `Ok(())` means accepted for delivery.
    async fn send(&self, email: &Email) -> Result<()>;

    /// Check if the backend is healthy/connected.
    fn is_healthy(&self) -> bool;
}
