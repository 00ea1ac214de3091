mod email;
#[cfg(feature = "desktop")]
mod desktop;
mod webhook;

#[cfg(feature = "desktop")]
pub use self::desktop::DesktopChannel;
pub use self::email::EmailChannel;
pub use self::webhook::WebhookChannel;

use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;

/// A destination for notifications.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable name used in logs and [`Report`](crate::Report)s.
    fn name(&self) -> &'static str;

    async fn send(&self, message: &Message) -> Result<()>;
}

#[cfg(test)]
pub(crate) use self::webhook::tests::endpoint as webhook_endpoint;
