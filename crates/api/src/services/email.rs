//! Ticket email delivery.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails (development)
//! - `smtp`: Sends via an SMTP relay
//! - `sendgrid`: Uses the SendGrid v3 API

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use domain::services::{NotificationResult, TicketDelivery, TicketNotifier};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::EmailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const QR_ATTACHMENT_NAME: &str = "ticket_qr_code.svg";
const QR_CONTENT_TYPE: &str = "image/svg+xml";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    /// Raw QR image bytes, attached when present.
    pub qr_attachment: Option<Vec<u8>>,
}

/// Sends ticket emails through the configured provider.
#[derive(Clone)]
pub struct TicketMailer {
    config: Arc<EmailConfig>,
    app_name: String,
    http: reqwest::Client,
}

impl TicketMailer {
    pub fn new(config: EmailConfig, app_name: impl Into<String>) -> Self {
        Self {
            config: Arc::new(config),
            app_name: app_name.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Renders the ticket email for one delivery.
    pub fn compose(&self, delivery: &TicketDelivery) -> EmailMessage {
        let body_text = format!(
            "Hello {name},\n\n\
             Your registration for {event} is confirmed!\n\n\
             Event: {event}\n\
             Date: {date}\n\
             Ticket ID: {ticket}\n\n\
             Your ticket QR code is attached. Show it at the event entrance.\n\
             Arrive 15 minutes early and bring a valid ID.\n\n\
             {app}",
            name = delivery.recipient_name,
            event = delivery.event_name,
            date = delivery.event_date_display,
            ticket = delivery.ticket_id,
            app = self.app_name,
        );

        let body_html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Your Event Ticket</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
        <h1 style="margin: 0;">Your Event Ticket</h1>
    </div>
    <div style="background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px;">
        <h2 style="margin-top: 0;">Hello {name}!</h2>
        <p>Your registration for <strong>{event}</strong> is confirmed!</p>
        <div style="background: white; padding: 20px; margin: 20px 0; border-radius: 8px;">
            <p><strong>Event:</strong> {event}</p>
            <p><strong>Date:</strong> {date}</p>
            <p><strong>Ticket ID:</strong> {ticket}</p>
        </div>
        <div style="text-align: center; margin: 30px 0;">
            <img src="{qr}" alt="Ticket QR code" width="240" height="240">
        </div>
        <p>The QR code is also attached as <strong>{attachment}</strong>. Show it at the event entrance.</p>
        <ul>
            <li>Arrive 15 minutes before the event</li>
            <li>Bring valid ID for verification</li>
        </ul>
        <p style="color: #666; font-size: 12px; text-align: center; border-top: 1px solid #ddd; padding-top: 20px;">{app}</p>
    </div>
</body>
</html>"#,
            name = escape_html(&delivery.recipient_name),
            event = escape_html(&delivery.event_name),
            date = escape_html(&delivery.event_date_display),
            ticket = escape_html(&delivery.ticket_id),
            qr = delivery.qr_code,
            attachment = QR_ATTACHMENT_NAME,
            app = escape_html(&self.app_name),
        );

        EmailMessage {
            to: delivery.recipient_email.clone(),
            to_name: delivery.recipient_name.clone(),
            subject: format!("Your Ticket for {}", delivery.event_name),
            body_text,
            body_html,
            qr_attachment: decode_data_uri(&delivery.qr_code),
        }
    }

    /// Send an email message through the configured provider.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "smtp" => self.send_smtp(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured(format!(
                    "unknown provider '{}'",
                    provider
                )))
            }
        }
    }

    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = %message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Ticket email (console provider)"
        );
        info!(body_text = %message.body_text, "Ticket email body");
        debug!(
            body_html_length = message.body_html.len(),
            has_attachment = message.qr_attachment.is_some(),
            "Ticket email HTML body"
        );
        Ok(())
    }

    async fn send_smtp(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.smtp_host.is_empty() {
            return Err(EmailError::NotConfigured("smtp_host is empty".into()));
        }

        let from = mailbox(&self.config.sender_name, &self.config.sender_email)?;
        let to = mailbox(&message.to_name, &message.to)?;

        let alternative = MultiPart::alternative()
            .singlepart(SinglePart::plain(message.body_text))
            .singlepart(SinglePart::html(message.body_html));
        let body = match message.qr_attachment {
            Some(bytes) => {
                let content_type = ContentType::parse(QR_CONTENT_TYPE)
                    .map_err(|e| EmailError::Build(e.to_string()))?;
                let attachment =
                    Attachment::new(QR_ATTACHMENT_NAME.to_string()).body(bytes, content_type);
                MultiPart::mixed()
                    .multipart(alternative)
                    .singlepart(attachment)
            }
            None => alternative,
        };

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let transport = self.smtp_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(format!("SMTP: {}", e)))?;

        info!(to = %message.to, subject = %message.subject, "Ticket email sent via SMTP");
        Ok(())
    }

    fn smtp_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| EmailError::NotConfigured(format!("SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };

        let mut builder = builder.port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }
        Ok(builder.build())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured("sendgrid_api_key is empty".into()));
        }

        let mut body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to, "name": message.to_name }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.body_text },
                { "type": "text/html", "value": message.body_html }
            ]
        });

        if let Some(bytes) = &message.qr_attachment {
            body["attachments"] = serde_json::json!([{
                "content": STANDARD.encode(bytes),
                "filename": QR_ATTACHMENT_NAME,
                "type": QR_CONTENT_TYPE,
                "disposition": "attachment"
            }]);
        }

        let response = self
            .http
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Ticket email sent via SendGrid");
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

#[async_trait]
impl TicketNotifier for TicketMailer {
    async fn send_ticket(&self, delivery: TicketDelivery) -> NotificationResult {
        if !self.config.enabled {
            debug!(
                to = %delivery.recipient_email,
                ticket_id = %delivery.ticket_id,
                "Email service disabled, skipping ticket email"
            );
            return NotificationResult::Skipped;
        }

        let message = self.compose(&delivery);
        match self.send(message).await {
            Ok(()) => NotificationResult::Sent,
            Err(e) => {
                warn!(
                    to = %delivery.recipient_email,
                    ticket_id = %delivery.ticket_id,
                    error = %e,
                    "Ticket email failed"
                );
                NotificationResult::Failed(e.to_string())
            }
        }
    }
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox, EmailError> {
    let address = email
        .parse::<Address>()
        .map_err(|e| EmailError::InvalidAddress(format!("{}: {}", email, e)))?;
    let name = (!name.trim().is_empty()).then(|| name.to_string());
    Ok(Mailbox::new(name, address))
}

/// Decodes the payload of a base64 `data:` URI.
fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let (_, payload) = uri.split_once("base64,")?;
    STANDARD.decode(payload).ok()
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
