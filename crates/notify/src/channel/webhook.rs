use super::Channel;
use crate::error::{ErrorKind, Result};
use crate::message::Message;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Incoming webhook accepting `{"text": ...}` (Slack and compatibles).
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}
impl WebhookChannel {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .or_raise(|| ErrorKind::Http)?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &Message) -> Result<()> {
        let payload = serde_json::json!({ "text": message.markup });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?;
        // Anything but a plain 200 (including other 2xx) counts as undelivered.
        if response.status() != StatusCode::OK {
            exn::bail!(ErrorKind::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use time::OffsetDateTime;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A one-shot HTTP endpoint answering with `status_line`, returning the
    /// raw request it received.
    pub(crate) async fn endpoint(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0; 4096];
            // Read until the JSON body has arrived.
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                request.extend_from_slice(&buffer[..read]);
                if read == 0 || request.ends_with(b"}") {
                    break;
                }
            }
            let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok");
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn posts_text_payload() {
        let (url, server) = endpoint("200 OK").await;
        let message = Message::status(3, "https://example.com/", OffsetDateTime::UNIX_EPOCH);
        WebhookChannel::new(url).unwrap().send(&message).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["text"], message.markup);
    }

    #[tokio::test]
    async fn non_200_is_a_failure() {
        let (url, _server) = endpoint("204 No Content").await;
        let message = Message::status(0, "https://example.com/", OffsetDateTime::UNIX_EPOCH);
        let err = WebhookChannel::new(url).unwrap().send(&message).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status(204)));
    }
}
