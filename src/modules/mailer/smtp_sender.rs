use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailMessage, EmailSender};
use crate::core::config::EmailConfig;
use crate::core::error::{AppError, Result};

/// SMTP sender over an async lettre transport
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let transport = if config.smtp_username.is_empty() {
            // No authentication (local development SMTP servers)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );

            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Internal(format!("SMTP relay error: {}", e)))?
                .credentials(creds)
                .port(config.smtp_port)
                .build()
        };

        tracing::info!(
            "SMTP email sender configured for {}:{}",
            config.smtp_host,
            config.smtp_port
        );

        Ok(Self { transport, from })
    }

    fn build(&self, message: &EmailMessage) -> Result<Message> {
        let to: Mailbox = message.to.parse().map_err(|e| {
            AppError::BadRequest(format!("Invalid recipient address '{}': {}", message.to, e))
        })?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone());

        let built = match &message.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                html.clone(),
            )),
            None => builder.singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(message.text_body.clone()),
            ),
        };

        built.map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = self.build(message)?;

        self.transport.send(email).await.map_err(|e| {
            tracing::error!("SMTP delivery to {} failed: {}", message.to, e);
            AppError::ExternalServiceError(format!("Failed to send email: {}", e))
        })?;

        tracing::debug!("Email '{}' sent to {}", message.subject, message.to);
        Ok(())
    }
}
