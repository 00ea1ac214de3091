//! When the continuous loop runs its next cycle.

use crate::error::{ErrorKind, Result};
use carwatch_config::ScheduleConfig;
use exn::ResultExt;
use std::fmt;
use std::time::Duration;
use time::{OffsetDateTime, Time, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A fixed pause between the end of one cycle and the start of the next.
    Interval(Duration),
    /// Once a day at a wall-clock time in a fixed offset.
    Daily { at: Time, offset: UtcOffset },
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let daily = config.daily_time().or_raise(|| ErrorKind::Config)?;
        Ok(match daily {
            Some(at) => Self::Daily {
                at,
                offset: config.offset().or_raise(|| ErrorKind::Config)?,
            },
            None => Self::Interval(config.interval()),
        })
    }

    /// How long to sleep from `now` until the next cycle is due.
    pub fn delay_from(&self, now: OffsetDateTime) -> Duration {
        match self {
            Self::Interval(interval) => *interval,
            Self::Daily { at, offset } => {
                let local = now.to_offset(*offset);
                let mut next = local.replace_time(*at);
                if next <= local {
                    next += time::Duration::DAY;
                }
                (next - local).unsigned_abs()
            },
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(interval) => write!(f, "every {} minutes", interval.as_secs() / 60),
            Self::Daily { at, offset } => write!(
                f,
                "daily at {:02}:{:02} (UTC{}{:02}:{:02})",
                at.hour(),
                at.minute(),
                if offset.is_negative() { '-' } else { '+' },
                offset.whole_hours().unsigned_abs(),
                offset.minutes_past_hour().unsigned_abs(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::{datetime, offset, time};

    const TOKYO_NINE: Schedule = Schedule::Daily {
        at: time!(09:00),
        offset: offset!(+9),
    };

    #[rstest]
    // 08:30 in Tokyo: later today.
    #[case(datetime!(2025-06-01 08:30 +9), 30 * 60)]
    // Exactly 09:00: tomorrow.
    #[case(datetime!(2025-06-01 09:00 +9), 24 * 3600)]
    // 09:01 in Tokyo: rolls over to tomorrow.
    #[case(datetime!(2025-06-01 09:01 +9), 24 * 3600 - 60)]
    // 23:30 UTC is 08:30 the next morning in Tokyo.
    #[case(datetime!(2025-05-31 23:30 UTC), 30 * 60)]
    fn daily_delay(#[case] now: OffsetDateTime, #[case] seconds: u64) {
        assert_eq!(TOKYO_NINE.delay_from(now), Duration::from_secs(seconds));
    }

    #[test]
    fn interval_ignores_clock() {
        let schedule = Schedule::Interval(Duration::from_secs(1800));
        assert_eq!(schedule.delay_from(datetime!(2025-06-01 09:00 UTC)), Duration::from_secs(1800));
        assert_eq!(schedule.to_string(), "every 30 minutes");
    }

    #[test]
    fn from_config_prefers_daily() {
        let config = ScheduleConfig {
            daily_at: Some("07:45".to_string()),
            utc_offset: "-05:30".to_string(),
            ..ScheduleConfig::default()
        };
        let schedule = Schedule::from_config(&config).unwrap();
        assert_eq!(
            schedule,
            Schedule::Daily {
                at: time!(07:45),
                offset: offset!(-5:30)
            }
        );
        assert_eq!(schedule.to_string(), "daily at 07:45 (UTC-05:30)");
        assert_eq!(
            Schedule::from_config(&ScheduleConfig::default()).unwrap(),
            Schedule::Interval(Duration::from_secs(30 * 60))
        );
    }

    #[test]
    fn malformed_daily_time() {
        let config = ScheduleConfig {
            daily_at: Some("9am".to_string()),
            ..ScheduleConfig::default()
        };
        let err = Schedule::from_config(&config).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config));
    }
}
