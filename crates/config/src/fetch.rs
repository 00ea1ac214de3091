use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A desktop Chrome user-agent; the site serves a reduced page to unknown agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Which page fetcher to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Headless Chrome/Chromium, renders client-side JavaScript.
    #[default]
    Chrome,
    /// Plain HTTP GET, no rendering.
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub backend: Backend,
    /// Fixed delay granted to client-side rendering before the DOM is captured.
    pub wait_seconds: u64,
    /// Grace period on top of the wait before the fetch is abandoned.
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
    /// Explicit Chrome executable; discovered from `PATH` or Flatpak when unset.
    pub chrome_path: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            wait_seconds: 5,
            timeout_seconds: 60,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            chrome_path: None,
        }
    }
}

impl FetchConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
