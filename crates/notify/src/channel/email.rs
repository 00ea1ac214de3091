use super::Channel;
use crate::error::{ErrorKind, Result};
use crate::message::Message;
use async_trait::async_trait;
use carwatch_config::EmailConfig;
use exn::{OptionExt, ResultExt};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Plain-text email over authenticated STARTTLS submission.
#[derive(Clone)]
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}
impl EmailChannel {
    /// `None` when the configuration is incomplete; the channel is then
    /// simply not configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>> {
        if !config.is_complete() {
            return Ok(None);
        }
        let server = config.smtp_server.as_deref().ok_or_raise(|| ErrorKind::Smtp)?;
        let username = config.username.clone().ok_or_raise(|| ErrorKind::Smtp)?;
        let password = config.password.clone().ok_or_raise(|| ErrorKind::Smtp)?;
        let recipient = config.recipient.as_deref().ok_or_raise(|| ErrorKind::Smtp)?;

        let from = mailbox(&username)?;
        let to = mailbox(recipient)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .or_raise(|| ErrorKind::Smtp)?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        Ok(Some(Self { transport, from, to }))
    }

    fn compose(&self, message: &Message) -> Result<Email> {
        Email::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(message.title.as_str())
            .multipart(MultiPart::mixed().singlepart(SinglePart::plain(message.plain.clone())))
            .or_raise(|| ErrorKind::Message)
    }
}
impl std::fmt::Debug for EmailChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailChannel").field("from", &self.from).field("to", &self.to).finish_non_exhaustive()
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        let email = self.compose(message)?;
        self.transport.send(email).await.or_raise(|| ErrorKind::Smtp)?;
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse::<Mailbox>().or_raise(|| ErrorKind::Address(address.to_string()))
}
