//! Console mailer for development.
//!
//! Prints messages to stdout instead of sending them. Recovery-code bodies
//! are redacted by default: stdout is often captured by logging systems in
//! containerized environments, and a captured code defeats the out-of-band
//! delivery. Do not use in production.

use super::{Email, Mailer};
use crate::error::Result;
use async_trait::async_trait;

/// A mailer that prints messages to stdout instead of sending them.
///
/// By default the body is redacted. Use `with_full_output(true)` to see
/// full content in development.
#[derive(Debug, Clone)]
pub struct ConsoleMailer {
    /// Prefix for log output
    prefix: String,
    /// Whether to show the full body (default: false)
    show_full_content: bool,
}

impl ConsoleMailer {
    /// Create a new console mailer with redacted bodies.
    pub fn new() -> Self {
        Self {
            prefix: "[MAIL]".to_string(),
            show_full_content: false,
        }
    }

    /// Create a console mailer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            show_full_content: false,
        }
    }

    /// Enable or disable full body output.
    ///
    /// When enabled, recovery codes will be visible wherever stdout ends up.
    /// Only enable in development.
    pub fn with_full_output(mut self, enabled: bool) -> Self {
        if enabled {
            tracing::warn!(
                "ConsoleMailer: full output enabled - message bodies will be visible in logs. \
                 Do not use in production!"
            );
        }
        self.show_full_content = enabled;
        self
    }
}

impl Default for ConsoleMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        println!("{} ════════════════════════════════════════", self.prefix);
        println!("{} From:    {}", self.prefix, email.from);
        println!("{} To:      {}", self.prefix, email.to);
        println!("{} Subject: {}", self.prefix, email.subject);
        println!("{} ────────────────────────────────────────", self.prefix);

        if self.show_full_content {
            for line in email.text.lines() {
                println!("{} {}", self.prefix, line);
            }
        } else {
            println!("{} [TEXT] {} bytes [REDACTED]", self.prefix, email.text.len());
        }

        println!("{} ════════════════════════════════════════", self.prefix);

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true // Console is always available
    }
}
