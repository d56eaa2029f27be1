//! Mail delivery seam and its lettre implementation.

use async_trait::async_trait;
use doccheck_core::settings::{SmtpEncryption, SmtpSettings};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    Address, AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::error::EmailError;

/// A fully rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html: bool,
}

/// Sends one message with the transport described by `smtp`.
///
/// Single attempt; implementations never retry.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Whether `s` parses as a mailbox address.
pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.parse::<Address>().is_ok()
}

/// Delivers over an SMTP relay, or through sendmail when SMTP is disabled.
///
/// The transport is built per send from the current settings, so settings
/// changes apply without a restart.
pub struct LettreMailer {
    default_from: String,
    default_from_name: String,
}

impl LettreMailer {
    /// `default_from` and `default_from_name` are used when the settings
    /// carry no usable sender.
    pub fn new(default_from: impl Into<String>, default_from_name: impl Into<String>) -> Self {
        Self {
            default_from: default_from.into(),
            default_from_name: default_from_name.into(),
        }
    }

    fn sender(&self, smtp: &SmtpSettings) -> Result<Mailbox, EmailError> {
        let email = if is_valid_email(&smtp.from_email) {
            smtp.from_email.trim()
        } else {
            self.default_from.as_str()
        };
        let name = if smtp.from_name.trim().is_empty() {
            self.default_from_name.clone()
        } else {
            smtp.from_name.clone()
        };
        let name = (!name.is_empty()).then_some(name);
        Ok(Mailbox::new(name, email.parse::<Address>()?))
    }

    fn build_message(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let content_type = if email.html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        Message::builder()
            .from(self.sender(smtp)?)
            .to(email.to.trim().parse()?)
            .subject(email.subject.clone())
            .header(content_type)
            .body(email.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, smtp: &SmtpSettings, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = self.build_message(smtp, email)?;

        if !smtp.enabled {
            AsyncSendmailTransport::<Tokio1Executor>::new()
                .send(message)
                .await?;
            tracing::info!(to = %email.to, transport = "sendmail", "Email sent");
            return Ok(());
        }

        let host = smtp.host.trim();
        if host.is_empty() {
            return Err(EmailError::Config("SMTP host is not set".into()));
        }

        let mut builder = match smtp.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            SmtpEncryption::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpEncryption::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        }
        .port(smtp.port);

        if smtp.auth && !smtp.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ));
        }

        builder.build().send(message).await?;

        tracing::info!(
            to = %email.to,
            host,
            encryption = smtp.encryption.as_str(),
            "Email sent"
        );
        Ok(())
    }
}
