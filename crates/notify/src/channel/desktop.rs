use super::Channel;
use crate::error::{ErrorKind, Result};
use crate::message::Message;
use async_trait::async_trait;
use exn::ResultExt;
use notify_rust::Notification;

/// Local desktop notification. Headless hosts have no notification daemon,
/// so failures here are expected and only logged.
#[derive(Debug, Clone, Default)]
pub struct DesktopChannel;

#[async_trait]
impl Channel for DesktopChannel {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        let summary = message.title.clone();
        let body = message.short.clone();
        tokio::task::spawn_blocking(move || {
            Notification::new()
                .appname("carwatch")
                .summary(&summary)
                .body(&body)
                .show()
                .map(|_| ())
        })
        .await
        .or_raise(|| ErrorKind::Desktop)?
        .or_raise(|| ErrorKind::Desktop)
    }
}
