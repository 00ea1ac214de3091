use serde::{Deserialize, Serialize};

/// Notification channels. Each channel is enabled purely by the presence of
/// its settings; nothing here is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Incoming-webhook URL (Slack compatible). The URL is the only credential.
    pub webhook_url: Option<String>,
    pub email: EmailConfig,
    /// Best-effort local desktop notification.
    pub desktop: bool,
    /// Send a status message over the webhook after every cycle, even when
    /// nothing new was found.
    pub heartbeat: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            email: EmailConfig::default(),
            desktop: true,
            heartbeat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    /// Never written back out; supply it through `EMAIL_PASSWORD`.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: None,
            smtp_port: 587,
            username: None,
            password: None,
            recipient: None,
            subject: None,
        }
    }
}

impl EmailConfig {
    /// Server, credentials and recipient are all present (and non-empty).
    pub fn is_complete(&self) -> bool {
        [&self.smtp_server, &self.username, &self.password, &self.recipient]
            .iter()
            .all(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_every_field() {
        let mut email = EmailConfig {
            smtp_server: Some("smtp.example.com".to_string()),
            username: Some("user@example.com".to_string()),
            password: Some("hunter2".to_string()),
            recipient: Some("me@example.com".to_string()),
            ..EmailConfig::default()
        };
        assert!(email.is_complete());
        email.password = Some("  ".to_string());
        assert!(!email.is_complete());
        email.password = None;
        assert!(!email.is_complete());
    }

    #[test]
    fn password_is_not_serialized() {
        let email = EmailConfig { password: Some("hunter2".to_string()), ..EmailConfig::default() };
        let json = serde_json::to_string(&email).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }
}
