//! Outbound verification email
//!
//! Delivery is best-effort: the registration flow logs and swallows
//! failures, so an SMTP outage never blocks account creation.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid message: {0}")]
    Message(String),

    #[error("smtp transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError>;
}

/// SMTP mailer backed by lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = config
            .from
            .parse()
            .map_err(|e| MailError::Message(format!("invalid from address: {e}")))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &str, code: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::Message(format!("invalid recipient: {e}")))?;
        let body = format!(
            "<h1>Welcome to the campus marketplace!</h1>\
             <p>Your verification code is: <strong>{code}</strong></p>\
             <p>Please enter this code in the app to verify your campus email.</p>\
             <p>If you didn't create this account, please ignore this email.</p>"
        );
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Verify your marketplace account")
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| MailError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Mailer used when SMTP is unconfigured; logs instead of sending
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_verification(&self, to: &str, _code: &str) -> Result<(), MailError> {
        tracing::info!(recipient = %to, "SMTP unconfigured, skipping verification email");
        Ok(())
    }
}
