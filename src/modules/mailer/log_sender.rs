use async_trait::async_trait;

use super::{EmailMessage, EmailSender};
use crate::core::error::Result;

/// Development sender: writes the message to the log instead of delivering it
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email not delivered (log backend):\n{}",
            message.text_body
        );
        Ok(())
    }
}
