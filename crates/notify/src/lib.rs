//! Notification fan-out.
//!
//! A [`Notifier`] holds one slot per supported channel. Each slot is either
//! configured or not; configured channels are attempted independently, and
//! a failure in one never prevents the others from being tried.

mod channel;
pub mod error;
mod message;

#[cfg(feature = "desktop")]
pub use crate::channel::DesktopChannel;
pub use crate::channel::{Channel, EmailChannel, WebhookChannel};
pub use crate::message::Message;

use crate::error::Result;
use carwatch_config::NotificationConfig;
use carwatch_extract::Listing;
use derive_more::Display;
use std::fmt;
use time::OffsetDateTime;

/// Result of one channel for one notification.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Outcome {
    #[display("sent")]
    Sent,
    #[display("failed ({_0})")]
    Failed(String),
    /// Never attempted. Not a failure.
    #[display("not configured")]
    NotConfigured,
}

/// Per-channel outcomes, in channel order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<(&'static str, Outcome)>,
}
impl Report {
    pub fn outcome(&self, channel: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|(name, _)| *name == channel).map(|(_, outcome)| outcome)
    }

    pub fn sent(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }
}
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, outcome)) in self.outcomes.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {outcome}")?;
        }
        Ok(())
    }
}

struct Slot {
    name: &'static str,
    channel: Option<Box<dyn Channel>>,
}

pub struct Notifier {
    slots: Vec<Slot>,
    heartbeat: bool,
    subject: Option<String>,
}

impl Notifier {
    /// A notifier with no channel slots at all.
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            heartbeat: false,
            subject: None,
        }
    }

    /// Build the webhook, email and desktop slots from configuration.
    ///
    /// Fails only when a channel is configured but unusable (an invalid
    /// email address, for example); absent settings leave the slot empty.
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        let webhook = match config.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => Some(Box::new(WebhookChannel::new(url)?) as Box<dyn Channel>),
            None => None,
        };
        let email = EmailChannel::from_config(&config.email)?.map(|channel| Box::new(channel) as Box<dyn Channel>);
        let notifier = Self::empty()
            .with_slot("webhook", webhook)
            .with_slot("email", email)
            .with_slot("desktop", desktop_channel(config.desktop))
            .with_heartbeat(config.heartbeat)
            .with_subject(config.email.subject.clone());
        tracing::debug!(channels = %notifier.configured().join(", "), "Notifier ready");
        Ok(notifier)
    }

    /// Append a slot; `None` records the channel as not configured.
    pub fn with_slot(mut self, name: &'static str, channel: Option<Box<dyn Channel>>) -> Self {
        self.slots.push(Slot { name, channel });
        self
    }

    pub fn with_channel(self, channel: impl Channel + 'static) -> Self {
        let name = channel.name();
        self.with_slot(name, Some(Box::new(channel)))
    }

    pub fn with_heartbeat(mut self, heartbeat: bool) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Replaces the generated title (email subject, desktop title).
    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject.filter(|subject| !subject.trim().is_empty());
        self
    }

    /// Names of the configured channels.
    pub fn configured(&self) -> Vec<&'static str> {
        self.slots.iter().filter(|slot| slot.channel.is_some()).map(|slot| slot.name).collect()
    }

    /// Announce `listings` on every configured channel.
    pub async fn notify(&self, listings: &[Listing], search_url: &str) -> Report {
        let mut message = Message::new_listings(listings, search_url, now());
        if let Some(subject) = &self.subject {
            message = message.with_title(format!("{subject} ({})", listings.len()));
        }
        self.broadcast(&message).await
    }

    /// Heartbeat over the webhook after a cycle, when enabled.
    pub async fn send_status(&self, known: usize, search_url: &str) -> Outcome {
        if !self.heartbeat {
            return Outcome::NotConfigured;
        }
        let Some(channel) = self.slots.iter().find(|slot| slot.name == "webhook").and_then(|slot| slot.channel.as_deref()) else {
            return Outcome::NotConfigured;
        };
        deliver(channel, &Message::status(known, search_url, now())).await
    }

    async fn broadcast(&self, message: &Message) -> Report {
        let mut report = Report::default();
        for slot in &self.slots {
            let outcome = match slot.channel.as_deref() {
                Some(channel) => deliver(channel, message).await,
                None => Outcome::NotConfigured,
            };
            report.outcomes.push((slot.name, outcome));
        }
        report
    }
}

async fn deliver(channel: &dyn Channel, message: &Message) -> Outcome {
    match channel.send(message).await {
        Ok(()) => {
            tracing::info!(channel = channel.name(), "Notification sent");
            Outcome::Sent
        },
        Err(err) => {
            tracing::warn!(channel = channel.name(), error = ?err, "Notification failed");
            Outcome::Failed(err.to_string())
        },
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(feature = "desktop")]
fn desktop_channel(enabled: bool) -> Option<Box<dyn Channel>> {
    enabled.then(|| Box::new(DesktopChannel) as Box<dyn Channel>)
}

#[cfg(not(feature = "desktop"))]
fn desktop_channel(enabled: bool) -> Option<Box<dyn Channel>> {
    if enabled {
        tracing::debug!("Desktop notifications requested but not compiled in");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use carwatch_config::EmailConfig;
    use std::sync::{Arc, Mutex};

    struct Recording {
        name: &'static str,
        fail: bool,
        sent: Arc<Mutex<Vec<Message>>>,
    }

    #[async_trait]
    impl Channel for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, message: &Message) -> Result<()> {
            if self.fail {
                exn::bail!(ErrorKind::Status(500));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn listing(name: &str) -> Listing {
        Listing {
            name: name.to_string(),
            price: "150万円".to_string(),
            year: None,
            site_marked_new: false,
            detected_at: OffsetDateTime::UNIX_EPOCH,
            source_url: String::new(),
        }
    }

    #[test]
    fn nothing_configured() {
        let config = NotificationConfig {
            desktop: false,
            ..NotificationConfig::default()
        };
        let notifier = Notifier::from_config(&config).unwrap();
        assert!(notifier.configured().is_empty());
    }

    #[tokio::test]
    async fn unset_webhook_is_not_configured() {
        let config = NotificationConfig {
            desktop: false,
            email: EmailConfig::default(),
            ..NotificationConfig::default()
        };
        let report = Notifier::from_config(&config).unwrap().notify(&[listing("プリウス")], "https://example.com/").await;
        assert_eq!(report.outcome("webhook"), Some(&Outcome::NotConfigured));
        assert_eq!(report.outcome("email"), Some(&Outcome::NotConfigured));
        assert_eq!(report.failed(), 0);
        assert_eq!(report.sent(), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_block_others() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::empty()
            .with_channel(Recording { name: "broken", fail: true, sent: sent.clone() })
            .with_channel(Recording { name: "working", fail: false, sent: sent.clone() })
            .with_slot("absent", None);
        let report = notifier.notify(&[listing("A"), listing("B")], "https://example.com/").await;
        assert!(matches!(report.outcome("broken"), Some(Outcome::Failed(_))));
        assert_eq!(report.outcome("working"), Some(&Outcome::Sent));
        assert_eq!(report.outcome("absent"), Some(&Outcome::NotConfigured));
        assert_eq!(sent.lock().unwrap()[0].title, "2 new listings");
        assert_eq!(
            report.to_string(),
            "broken: failed (unexpected HTTP status: 500), working: sent, absent: not configured"
        );
    }

    #[tokio::test]
    async fn custom_subject() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::empty()
            .with_subject(Some("Prius alert".to_string()))
            .with_channel(Recording { name: "working", fail: false, sent: sent.clone() });
        notifier.notify(&[listing("A")], "https://example.com/").await;
        assert_eq!(sent.lock().unwrap()[0].title, "Prius alert (1)");
    }

    #[tokio::test]
    async fn heartbeat_uses_webhook_only_when_enabled() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let webhook = || Some(Box::new(Recording { name: "webhook", fail: false, sent: sent.clone() }) as Box<dyn Channel>);
        let disabled = Notifier::empty().with_slot("webhook", webhook());
        assert_eq!(disabled.send_status(5, "https://example.com/").await, Outcome::NotConfigured);

        let enabled = Notifier::empty().with_slot("webhook", webhook()).with_heartbeat(true);
        assert_eq!(enabled.send_status(5, "https://example.com/").await, Outcome::Sent);
        assert!(sent.lock().unwrap()[0].markup.contains("5 known"));
    }

    #[tokio::test]
    async fn webhook_delivery_end_to_end() {
        let (url, server) = crate::channel::webhook_endpoint("200 OK").await;
        let config = NotificationConfig {
            webhook_url: Some(url),
            desktop: false,
            ..NotificationConfig::default()
        };
        let report = Notifier::from_config(&config).unwrap().notify(&[listing("プリウス")], "https://example.com/").await;
        assert_eq!(report.outcome("webhook"), Some(&Outcome::Sent));
        assert!(server.await.unwrap().contains("プリウス"));
    }
}
