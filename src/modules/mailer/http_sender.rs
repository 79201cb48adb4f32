use async_trait::async_trait;
use serde::Serialize;

use super::{EmailMessage, EmailSender};
use crate::core::config::EmailConfig;
use crate::core::error::{AppError, Result};

/// Body posted to the email gateway
#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Sender that hands messages to an HTTP email gateway
pub struct HttpEmailSender {
    http_client: reqwest::Client,
    url: String,
    token: Option<String>,
    from: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let url = config
            .gateway_url
            .clone()
            .ok_or_else(|| AppError::Internal("EMAIL_GATEWAY_URL is not set".to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url,
            token: config.gateway_token.clone(),
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let body = GatewayRequest {
            from: self.from.clone(),
            to: &message.to,
            subject: &message.subject,
            text: &message.text_body,
            html: message.html_body.as_deref(),
        };

        let mut request = self.http_client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Email gateway request failed: {}", e);
            AppError::ExternalServiceError(format!("Failed to send email: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Email gateway error: HTTP {} - {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Failed to send email: HTTP {}",
                status
            )));
        }

        tracing::debug!("Email '{}' accepted by gateway for {}", message.subject, message.to);
        Ok(())
    }
}
