use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<()>;
}

/// Delivers through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &MailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("Failed to configure SMTP relay {}", host))?;
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(SmtpMailer {
            transport: builder.build(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse().context("Invalid MAIL_FROM address")?)
            .to(message.recipient.parse().context("Invalid recipient address")?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .context("Failed to build mail")?;
        self.transport
            .send(email)
            .await
            .context("Failed to send mail")?;
        Ok(())
    }
}

/// Writes mails to the log instead of sending them. Used when no SMTP
/// relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            body = %message.body,
            "outgoing mail"
        );
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    match &config.smtp_host {
        Some(host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => {
            tracing::warn!("SMTP_HOST not set, mails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub fn password_reset_mail(recipient: &str, username: &str, link: &str) -> MailMessage {
    MailMessage {
        subject: "Password reset".to_owned(),
        body: format!(
            "Hi {username},\n\n\
             Use the link below to choose a new password:\n\n\
             {link}\n\n\
             The link can be used once. If you did not ask for a reset you can ignore this mail.\n"
        ),
        recipient: recipient.to_owned(),
    }
}
