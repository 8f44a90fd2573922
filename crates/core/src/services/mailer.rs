//! Outbound email.

use async_trait::async_trait;
use inkwell_common::{AppError, AppResult, config::EmailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;

/// A plain-text message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Trait for sending email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message.
    async fn send(&self, mail: OutgoingMail) -> AppResult<()>;
}

/// Type alias for a shared mailer.
pub type MailerService = Arc<dyn Mailer>;

/// Writes messages to the log instead of sending them.
///
/// Used when no SMTP relay is configured.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Email (not sent, SMTP disabled)");
        Ok(())
    }
}

/// Sends mail through an SMTP relay with STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from configuration.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Email(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        tracing::debug!(to = %mail.to, "Email sent");
        Ok(())
    }
}

/// Pick the SMTP mailer when configured, otherwise log messages.
pub fn from_config(config: Option<&EmailConfig>) -> AppResult<MailerService> {
    match config {
        Some(email) => Ok(Arc::new(SmtpMailer::new(email)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_mail() {
        let mailer = LogMailer;
        let result = mailer
            .send(OutgoingMail {
                to: "erin@example.com".to_string(),
                subject: "Activate".to_string(),
                body: "link".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_from_address() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            from_address: "not an address".to_string(),
        };
        assert!(matches!(SmtpMailer::new(&config), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_without_smtp_uses_log_mailer() {
        let mailer = from_config(None).unwrap();
        assert!(
            mailer
                .send(OutgoingMail {
                    to: "a@example.com".to_string(),
                    subject: "s".to_string(),
                    body: "b".to_string(),
                })
                .await
                .is_ok()
        );
    }
}
