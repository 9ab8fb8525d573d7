//! Email transport for booking notifications.
//!
//! Supported providers:
//! - `console`: logs emails (development)
//! - `smtp`: sends via SMTP server
//! - `sendgrid`: uses the SendGrid API

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use domain::models::email::EmailPayload;

use crate::config::EmailConfig;

/// Errors that can occur while sending an email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email transport behind the provider switch.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Base URL used to build cancel/reconfirm links.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Sends a rendered payload to a recipient.
    pub async fn send(&self, to: &str, payload: &EmailPayload) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(to = %to, subject = %payload.subject, "Email service disabled, skipping send");
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(to, payload),
            "smtp" => self.send_smtp(to, payload),
            "sendgrid" => self.send_sendgrid(to, payload).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Console provider - logs the email (for development).
    fn send_console(&self, to: &str, payload: &EmailPayload) -> Result<(), EmailError> {
        info!(
            to = %to,
            subject = %payload.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );
        info!(body_text = %payload.body_text, "Email body (plain text)");
        Ok(())
    }

    /// SMTP provider.
    fn send_smtp(&self, to: &str, payload: &EmailPayload) -> Result<(), EmailError> {
        if self.config.smtp_host.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        // TODO: wire up lettre for real SMTP delivery; until then log only.
        warn!(
            provider = "smtp",
            host = %self.config.smtp_host,
            port = %self.config.smtp_port,
            to = %to,
            subject = %payload.subject,
            "SMTP provider configured but delivery is log-only pending lettre integration"
        );
        Ok(())
    }

    /// SendGrid provider.
    async fn send_sendgrid(&self, to: &str, payload: &EmailPayload) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let client = reqwest::Client::new();

        let mut content = vec![serde_json::json!({
            "type": "text/plain",
            "value": payload.body_text
        })];
        if let Some(html) = &payload.body_html {
            content.push(serde_json::json!({
                "type": "text/html",
                "value": html
            }));
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": to }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": payload.subject,
            "content": content
        });

        let response = client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.sendgrid_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %to, subject = %payload.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}
