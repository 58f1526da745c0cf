use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

/// Delivers mail through an SMTP relay (STARTTLS).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        info!("🔌 SMTP mailer configured for {}:{}", config.host, config.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::External(format!("SMTP send failed: {}", e)))?;
        info!("✅ Email '{}' sent to {}", message.subject, message.to);
        Ok(())
    }
}

/// Writes outgoing mail to the log; used when SMTP is not configured.
pub struct LogMailer;

fn log_email(message: &EmailMessage) {
    info!(
        to = %message.to,
        subject = %message.subject,
        "📧 Email not sent through SMTP:\n{}",
        message.text_body
    );
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        log_email(message);
        Ok(())
    }
}

pub fn mailer_from_config(config: Option<&SmtpConfig>) -> Result<Arc<dyn EmailSender>, AppError> {
    match config {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        None => {
            info!("📧 SMTP disabled, emails will be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Sends the message, falling back to the log when delivery fails.
pub async fn deliver(mailer: &dyn EmailSender, message: EmailMessage) {
    if let Err(e) = mailer.send(&message).await {
        error!("❌ Failed to send email to {}: {}", message.to, e);
        log_email(&message);
    }
}

pub fn confirmation_email(to: &str, full_name: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Confirm your email".to_string(),
        text_body: format!(
            "Hello {},\n\nPlease confirm your account by opening this link:\n{}\n\nThe link expires in 24 hours.",
            full_name, link
        ),
        html_body: format!(
            "<p>Hello {},</p><p>Please confirm your account by <a href='{}'>clicking here</a>.</p><p>The link expires in 24 hours.</p>",
            full_name, link
        ),
    }
}

pub fn password_reset_email(to: &str, full_name: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        text_body: format!(
            "Hello {},\n\nYou can reset your password by opening this link:\n{}\n\nThe link expires in 1 hour.",
            full_name, link
        ),
        html_body: format!(
            "<p>Hello {},</p><p>You can reset your password by <a href='{}'>clicking here</a>.</p><p>The link expires in 1 hour.</p>",
            full_name, link
        ),
    }
}
