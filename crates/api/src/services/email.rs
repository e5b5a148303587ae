//! Email service for password reset links and help desk notifications.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails to console (development)
//! - `sendgrid`: Uses SendGrid API

use crate::config::EmailConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Recipient name (optional)
    pub to_name: Option<String>,
    /// Address replies should go to (optional)
    pub reply_to: Option<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
}

/// Help request details included in the help desk notification.
#[derive(Debug, Clone)]
pub struct HelpNotification<'a> {
    pub request_id: i64,
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    pub priority: &'a str,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Help desk mailbox.
    pub fn support_address(&self) -> &str {
        &self.config.support_address
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Send the password reset link.
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        let message = EmailMessage {
            to: to_email.to_string(),
            to_name: Some(to_name.to_string()),
            reply_to: None,
            subject: "Password reset - Inter-Ministry Data Exchange".to_string(),
            body_text: password_reset_body(&self.config.base_url, to_name, reset_token),
        };

        self.send(message).await
    }

    /// Notify the help desk about a new help request.
    pub async fn send_help_request_notification(
        &self,
        request: &HelpNotification<'_>,
    ) -> Result<(), EmailError> {
        let message = EmailMessage {
            to: self.config.support_address.clone(),
            to_name: None,
            reply_to: Some(request.email.to_string()),
            subject: format!("[Help #{}] {}", request.request_id, request.subject),
            body_text: help_request_body(request),
        };

        self.send(message).await
    }

    /// Console provider - logs email to console (for development).
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            reply_to = ?message.reply_to,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );

        debug!(body_text = %message.body_text, "Email body");

        Ok(())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let client = reqwest::Client::new();
        let body = sendgrid_payload(&self.config, &message);

        let response = client
            .post(SENDGRID_SEND_URL)
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
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via SendGrid"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "SendGrid API error"
            );
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

fn sendgrid_payload(config: &EmailConfig, message: &EmailMessage) -> serde_json::Value {
    let mut recipient = serde_json::json!({ "email": message.to });
    if let Some(name) = &message.to_name {
        recipient["name"] = serde_json::json!(name);
    }

    let mut body = serde_json::json!({
        "personalizations": [{ "to": [recipient] }],
        "from": {
            "email": config.sender_email,
            "name": config.sender_name
        },
        "subject": message.subject,
        "content": [{
            "type": "text/plain",
            "value": message.body_text
        }]
    });

    if let Some(reply_to) = &message.reply_to {
        body["reply_to"] = serde_json::json!({ "email": reply_to });
    }

    body
}

fn password_reset_body(base_url: &str, name: &str, token: &str) -> String {
    format!(
        r#"Hello {name},

A password reset was requested for your Inter-Ministry Data Exchange account.
Use the link below to choose a new password:

{base_url}/reset-password?token={token}

This link expires in 1 hour and can be used once.

If you did not request a reset, you can ignore this email."#,
        name = name,
        base_url = base_url.trim_end_matches('/'),
        token = token
    )
}

fn help_request_body(request: &HelpNotification<'_>) -> String {
    format!(
        r#"New help request #{id}

From: {name} <{email}>
Priority: {priority}
Subject: {subject}

{message}"#,
        id = request.request_id,
        name = request.name,
        email = request.email,
        priority = request.priority,
        subject = request.subject,
        message = request.message
    )
}
