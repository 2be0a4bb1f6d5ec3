use crate::config::EmailConfiguration;
use crate::email::EmailError;
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// Sends the rendered report to its recipients
#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Sends one message addressed to every recipient
    async fn send_email_report(
        &self,
        from_address: &str,
        subject: &str,
        recipients: &[String],
        body: &str,
    ) -> Result<(), EmailError>;
}

/// SMTP mailer backed by lettre's tokio transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Creates a mailer for the configured relay
    ///
    /// Credentials are only attached when both username and password are set.
    pub fn new(config: &EmailConfiguration) -> Result<Self, EmailError> {
        let mut builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// Builds the message for a set of recipients
pub(crate) fn build_message(
    from_address: &str,
    subject: &str,
    recipients: &[String],
    body: &str,
) -> Result<Message, EmailError> {
    if recipients.is_empty() {
        return Err(EmailError::NoRecipients);
    }

    let from: Mailbox = from_address.parse()?;
    let mut message = Message::builder().from(from).subject(subject);
    for recipient in recipients {
        let to: Mailbox = recipient.parse()?;
        message = message.to(to);
    }

    Ok(message.body(body.to_string())?)
}

#[async_trait]
impl ReportMailer for SmtpMailer {
    async fn send_email_report(
        &self,
        from_address: &str,
        subject: &str,
        recipients: &[String],
        body: &str,
    ) -> Result<(), EmailError> {
        let message = build_message(from_address, subject, recipients, body)?;

        self.transport.send(message).await?;
        tracing::info!("Email report sent to {} recipient(s)", recipients.len());

        Ok(())
    }
}
