//! Outgoing email
//!
//! Services depend on the [`EmailSender`] trait; the concrete backend is
//! picked from `EMAIL_BACKEND` at startup.

mod http_sender;
mod log_sender;
mod smtp_sender;
mod templates;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::{EmailBackend, EmailConfig};
use crate::core::error::Result;

pub use http_sender::HttpEmailSender;
pub use log_sender::LogEmailSender;
pub use smtp_sender::SmtpEmailSender;
pub use templates::OtpEmail;

#[cfg(test)]
pub use recording::RecordingEmailSender;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Build the sender selected by configuration
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    let sender: Arc<dyn EmailSender> = match config.backend {
        EmailBackend::Smtp => Arc::new(SmtpEmailSender::new(config)?),
        EmailBackend::Http => Arc::new(HttpEmailSender::new(config)?),
        EmailBackend::Log => Arc::new(LogEmailSender),
    };

    Ok(sender)
}

#[cfg(test)]
mod recording {
    use super::*;
    use crate::core::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Keeps every message in memory; can be switched to fail
    #[derive(Debug, Default)]
    pub struct RecordingEmailSender {
        sent: Mutex<Vec<EmailMessage>>,
        failing: AtomicBool,
    }

    impl RecordingEmailSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingEmailSender {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::ExternalServiceError(
                    "Email delivery failed".to_string(),
                ));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
