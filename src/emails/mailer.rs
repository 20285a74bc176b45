//! Mail transports.
//!
//! [`SmtpMailer`] delivers through an SMTP relay. [`LogMailer`] only writes
//! messages to the log and is meant for development. [`OutboxMailer`] keeps
//! messages in memory for tests and dry runs.

use crate::{
    config::settings::{EmailConfig, MailTransport, SmtpConfig, SmtpSecurity},
    errors::{Error, Result},
};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Fallback for `[email.smtp] password`.
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

fn mail_error(e: impl std::fmt::Display) -> Error {
    Error::Mail {
        message: e.to_string(),
    }
}

/// A plain text message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
}

/// Something that can deliver an [`EmailMessage`].
#[axum::async_trait]
pub trait Mailer: Send + Sync {
    /// Sender address used for every message
    fn from_address(&self) -> &str;

    /// Delivers one message.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Logs messages instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    /// Creates a mailer sending as `from`.
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[axum::async_trait]
impl Mailer for LogMailer {
    fn from_address(&self) -> &str {
        &self.from
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "Email logged, not delivered"
        );
        Ok(())
    }
}

/// Collects messages in memory. Recipients listed with
/// [`OutboxMailer::reject`] fail with a transport error.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    from: String,
    sent: Mutex<Vec<EmailMessage>>,
    rejected: HashSet<String>,
}

impl OutboxMailer {
    /// Creates an empty outbox sending as `from`.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    /// Makes every send to `recipient` fail.
    #[must_use]
    pub fn reject(mut self, recipient: impl Into<String>) -> Self {
        self.rejected.insert(recipient.into());
        self
    }

    /// Messages accepted so far.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[axum::async_trait]
impl Mailer for OutboxMailer {
    fn from_address(&self) -> &str {
        &self.from
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.rejected.contains(&message.to) {
            return Err(Error::Mail {
                message: format!("recipient {} rejected", message.to),
            });
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Delivers messages through an SMTP relay.
pub struct SmtpMailer {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds a pooled relay transport. No connection is made until the
    /// first message is sent.
    pub fn new(
        from: impl Into<String>,
        config: &SmtpConfig,
        password: Option<String>,
    ) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::Config {
                message: "email.smtp.host is required for the smtp transport".to_string(),
            });
        }
        type Transport = AsyncSmtpTransport<Tokio1Executor>;
        let builder = match config.security {
            SmtpSecurity::Starttls => Transport::starttls_relay(&config.host).map_err(mail_error)?,
            SmtpSecurity::Tls => Transport::relay(&config.host).map_err(mail_error)?,
            SmtpSecurity::Plain => Transport::builder_dangerous(&config.host),
        };
        let builder = builder.port(config.port);
        let builder = match (&config.username, password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password))
            }
            _ => builder,
        };
        Ok(Self {
            from: from.into(),
            transport: builder.build(),
        })
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish_non_exhaustive()
    }
}

#[axum::async_trait]
impl Mailer for SmtpMailer {
    fn from_address(&self) -> &str {
        &self.from
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(message.from.parse().map_err(mail_error)?)
            .to(message.to.parse().map_err(mail_error)?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(mail_error)?;
        self.transport.send(email).await.map_err(mail_error)?;
        info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Builds the transport selected in the `[email]` section.
pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    let from = config.from_address.clone();
    Ok(match config.transport {
        MailTransport::Log => {
            warn!("Email transport is \"log\": messages are written to the log and not delivered");
            Arc::new(LogMailer::new(from))
        }
        MailTransport::Outbox => Arc::new(OutboxMailer::new(from)),
        MailTransport::Smtp => {
            let password = config
                .smtp
                .password
                .clone()
                .or_else(|| std::env::var(SMTP_PASSWORD_ENV).ok());
            info!(host = %config.smtp.host, port = config.smtp.port, "Using SMTP mail transport");
            Arc::new(SmtpMailer::new(from, &config.smtp, password)?)
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            from: "noreply@test".to_string(),
            to: to.to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_outbox_rejects_listed_recipients() -> Result<()> {
        let outbox = OutboxMailer::new("noreply@test").reject("bounce@test");
        outbox.send(&message("alice@test")).await?;
        assert!(matches!(outbox.send(&message("bounce@test")).await, Err(Error::Mail { .. })));
        assert_eq!(outbox.sent().await, vec![message("alice@test")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_smtp_transport_from_config() {
        let mut config = EmailConfig {
            from_address: "budget@example.com".to_string(),
            transport: MailTransport::Smtp,
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                username: Some("budget".to_string()),
                password: Some("secret".to_string()),
                ..SmtpConfig::default()
            },
        };
        let mailer = mailer_from_config(&config).unwrap();
        assert_eq!(mailer.from_address(), "budget@example.com");

        config.smtp.host = String::new();
        assert!(matches!(mailer_from_config(&config), Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_smtp_rejects_malformed_recipient() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            security: SmtpSecurity::Plain,
            ..SmtpConfig::default()
        };
        let mailer = SmtpMailer::new("noreply@example.com", &config, None).unwrap();
        let result = mailer.send(&message("not an address")).await;
        assert!(matches!(result, Err(Error::Mail { .. })));
    }
}
