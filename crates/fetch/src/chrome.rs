use crate::error::{ErrorKind, Result};
use crate::{Fetcher, Url};
use async_trait::async_trait;
use carwatch_config::FetchConfig;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Command as SyncCommand, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::instrument;

/// Represents a Chrome/Chromium executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chrome {
    /// A directly executable binary.
    Binary { path: PathBuf },
    /// A Flatpak-installed application.
    Flatpak { flatpak: PathBuf, app_id: String },
}
impl Chrome {
    pub(crate) fn discover() -> Result<Self> {
        let executables = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
        for exe in executables {
            if let Ok(path) = which::which(exe) {
                tracing::debug!(chrome = %path.display(), "Discovered Chrome in PATH");
                return Ok(Self::Binary { path });
            }
        }
        tracing::info!("Chrome executable not found in PATH");
        if let Ok(flatpak) = which::which("flatpak") {
            tracing::trace!(flatpak = %flatpak.display(), "Discovered Flatpak on system; searching installed apps");
            let flatpak_apps = ["com.google.Chrome", "org.chromium.Chromium"];
            for app_id in flatpak_apps {
                if SyncCommand::new(&flatpak).args(["info", app_id]).output().is_ok_and(|o| o.status.success()) {
                    return Ok(Self::Flatpak {
                        flatpak,
                        app_id: app_id.to_string(),
                    });
                }
            }
        } else {
            tracing::info!("Flatpak not found; skipping containerized Chrome checks.");
        }
        exn::bail!(ErrorKind::ChromeNotFound);
    }

    /// Use an explicitly configured executable, either a path or a name
    /// resolvable through `PATH`.
    pub(crate) fn at(path: &Path) -> Result<Self> {
        match which::which(path) {
            Ok(path) => Ok(Self::Binary { path }),
            Err(_) => exn::bail!(ErrorKind::ChromeMissingAt(path.to_path_buf())),
        }
    }

    fn command(&self) -> Command {
        match self {
            Self::Binary { path } => Command::new(path),
            Self::Flatpak { flatpak, app_id } => {
                let mut command = Command::new(flatpak);
                command.args(["run", app_id.as_str()]);
                command
            },
        }
    }
}

/// Loads pages in headless Chrome and returns the DOM after client-side
/// rendering has had `wait` to settle.
#[derive(Debug, Clone)]
pub struct ChromeFetcher {
    chrome: Chrome,
    wait: Duration,
    timeout: Duration,
    user_agent: Option<String>,
}
impl ChromeFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let chrome = match &config.chrome_path {
            Some(path) => Chrome::at(path)?,
            None => Chrome::discover()?,
        };
        Ok(Self {
            chrome,
            wait: config.wait(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone().filter(|ua| !ua.is_empty()),
        })
    }

    fn args(&self, url: &Url) -> Vec<String> {
        let mut args = vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--virtual-time-budget={}", self.wait.as_millis()),
        ];
        if let Some(user_agent) = &self.user_agent {
            args.push(format!("--user-agent={user_agent}"));
        }
        args.push("--dump-dom".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Fetcher for ChromeFetcher {
    fn name(&self) -> &str {
        "chrome"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut command = self.chrome.command();
        command
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = command.spawn().or_raise(|| ErrorKind::Io)?;
        // The virtual time budget only bounds page scripts; the process itself
        // gets the wait plus the configured timeout before it is killed.
        let output = tokio::time::timeout(self.wait + self.timeout, child.wait_with_output())
            .await
            .or_raise(|| ErrorKind::ChromeTimeout)?
            .or_raise(|| ErrorKind::Io)?;
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            tracing::debug!(code, stderr = %String::from_utf8_lossy(&output.stderr), "Chrome failed");
            exn::bail!(ErrorKind::ChromeFailed(code));
        }
        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyPage);
        }
        tracing::debug!(bytes = html.len(), "Page rendered");
        Ok(html)
    }
}
