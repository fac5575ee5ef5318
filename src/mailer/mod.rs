//! Email collaborator
//!
//! Interface consumed by the password-reset flow. Delivery is
//! fire-and-forget: a failed send is logged and never propagated into the
//! request outcome. The shipped implementation writes messages to the log;
//! real transport is outside this service's scope.

use thiserror::Error;

/// An outbound email message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Email delivery seam.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Mailer that logs instead of delivering.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email (log transport): {}",
            message.text
        );
        Ok(())
    }
}
