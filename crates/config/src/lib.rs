//! Layered configuration for carwatch.
//!
//! Values are resolved, later layers winning, from:
//!
//! 1. built-in defaults,
//! 2. a JSON file (explicit path, or the platform config directory),
//! 3. the variables used by earlier deployments (`SLACK_WEBHOOK_URL`,
//!    `SMTP_SERVER`, `SMTP_PORT`, `EMAIL_USER`, `EMAIL_PASSWORD`, `TO_EMAIL`),
//! 4. `CARWATCH_`-prefixed variables, `__` separating nested keys
//!    (`CARWATCH_SEARCH__PRICE_MAX=150`).

pub mod error;
mod fetch;
mod log;
mod notification;
mod schedule;
mod search;
mod store;

pub use crate::fetch::{Backend, DEFAULT_USER_AGENT, FetchConfig};
pub use crate::log::LogConfig;
pub use crate::notification::{EmailConfig, NotificationConfig};
pub use crate::schedule::ScheduleConfig;
pub use crate::search::SearchConfig;
pub use crate::store::StoreConfig;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "CARWATCH_";
const CONFIG_FILE_NAME: &str = "config.json";
const LEGACY_ENV: &[(&str, &str)] = &[
    ("SLACK_WEBHOOK_URL", "notification.webhook_url"),
    ("SMTP_SERVER", "notification.email.smtp_server"),
    ("SMTP_PORT", "notification.email.smtp_port"),
    ("EMAIL_USER", "notification.email.username"),
    ("EMAIL_PASSWORD", "notification.email.password"),
    ("TO_EMAIL", "notification.email.recipient"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    /// Named alternatives to `search`, selected with `--preset`. Unset keys
    /// take the built-in search defaults, not those of `search`.
    pub presets: BTreeMap<String, SearchConfig>,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    pub notification: NotificationConfig,
    pub schedule: ScheduleConfig,
    pub log: LogConfig,
}

impl Config {
    /// Platform configuration file, e.g. `~/.config/carwatch/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "carwatch").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Build the layered [`Figment`] without extracting it.
    ///
    /// An explicit `path` must exist; the platform default is skipped
    /// silently when absent.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = figment.merge(Json::file_exact(path)),
            None => {
                if let Some(default) = Self::default_path().filter(|p| p.exists()) {
                    tracing::debug!(path = %default.display(), "Using configuration file from platform config directory");
                    figment = figment.merge(Json::file_exact(default));
                }
            },
        }
        let legacy = Env::raw().only(&LEGACY_ENV.iter().map(|(env, _)| *env).collect::<Vec<_>>()).map(|key| {
            LEGACY_ENV
                .iter()
                .find(|(env, _)| key == *env)
                .map(|(_, target)| (*target).into())
                .unwrap_or_else(|| key.as_str().to_string().into())
        });
        Ok(figment.merge(legacy).merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate the configuration.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.price_max == Some(0) {
            exn::bail!(ErrorKind::Invalid {
                field: "search.price_max",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.search.ancestor_hops == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "search.ancestor_hops",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.search.name_filter.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "search.name_filter",
                reason: "must not be empty".to_string(),
            });
        }
        self.schedule.validate()
    }

    /// Replace `search` with the named preset.
    pub fn with_preset(mut self, name: &str) -> Result<Self> {
        let Some(search) = self.presets.get(name).cloned() else {
            exn::bail!(ErrorKind::UnknownPreset(name.to_string()));
        };
        tracing::debug!(preset = name, search = %search.describe(), "Using search preset");
        self.search = search;
        self.validate()?;
        Ok(self)
    }

    /// Pretty JSON of the effective configuration. Secrets are never included.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).or_raise(|| ErrorKind::Io)
    }

    /// Write the default configuration to `path`, refusing to overwrite.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            exn::bail!(ErrorKind::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
        }
        let json = Config::default().to_json_pretty()?;
        std::fs::write(path, json + "\n").or_raise(|| ErrorKind::Io)?;
        tracing::info!(path = %path.display(), "Default configuration written");
        Ok(())
    }
}
