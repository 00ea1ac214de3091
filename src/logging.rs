//! Console and file logging.

use crate::error::{ErrorKind, Result};
use carwatch_config::LogConfig;
use exn::ResultExt;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LEVELS: [LevelFilter; 6] = [
    LevelFilter::OFF,
    LevelFilter::ERROR,
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level is shifted up by
/// `verbosity` (`-v`) or down by negative values (`-q`). When a log file is
/// configured, every line is also appended there without colour codes by a
/// background writer; keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init(config: &LogConfig, verbosity: i8) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(&config.level, verbosity)));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let (file, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        },
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .or_raise(|| ErrorKind::Logging)?;
    Ok(guard)
}

/// Append-only appender for `path`, creating its directory first.
fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let Some(name) = path.file_name() else {
        exn::bail!(ErrorKind::Logging);
    };
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    std::fs::create_dir_all(dir).or_raise(|| ErrorKind::Logging)?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .or_raise(|| ErrorKind::Logging)
}

/// Filter directive for `level` adjusted by `verbosity` steps. Anything that
/// isn't a plain level is treated as a full directive and left alone.
fn directive(level: &str, verbosity: i8) -> String {
    let Ok(base) = level.trim().parse::<LevelFilter>() else {
        return level.to_string();
    };
    let index = LEVELS.iter().position(|l| *l == base).unwrap_or(3) as isize;
    let shifted = (index + verbosity as isize).clamp(0, LEVELS.len() as isize - 1);
    LEVELS[shifted as usize].to_string().to_lowercase()
}
