use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::macros::format_description;
use time::{Time, UtcOffset};

/// When continuous mode runs its cycles.
///
/// A `daily_at` time takes precedence over the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
    /// Wall-clock time of the daily check, `HH:MM`.
    pub daily_at: Option<String>,
    /// Offset `daily_at` is expressed in, `+HH:MM`.
    pub utc_offset: String,
    /// Delay before retrying after a cycle blew up unexpectedly.
    pub retry_backoff_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            daily_at: None,
            utc_offset: "+09:00".to_string(),
            retry_backoff_seconds: 60,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_seconds)
    }

    pub fn daily_time(&self) -> Result<Option<Time>> {
        let Some(daily_at) = self.daily_at.as_deref() else {
            return Ok(None);
        };
        let time = Time::parse(daily_at.trim(), format_description!("[hour]:[minute]")).or_raise(|| {
            ErrorKind::Invalid {
                field: "schedule.daily_at",
                reason: format!("expected HH:MM, found '{daily_at}'"),
            }
        })?;
        Ok(Some(time))
    }

    pub fn offset(&self) -> Result<UtcOffset> {
        UtcOffset::parse(
            self.utc_offset.trim(),
            format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        )
        .or_raise(|| ErrorKind::Invalid {
            field: "schedule.utc_offset",
            reason: format!("expected +HH:MM, found '{}'", self.utc_offset),
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let daily = self.daily_time()?;
        self.offset()?;
        if daily.is_none() && self.interval_minutes == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "schedule.interval_minutes",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
