//! Process-wide logger configuration.
//!
//! The crate emits `tracing` events for every attempt, retry, delay, callback
//! and failure. Nothing is printed until a subscriber is installed, either
//! with [`configure_logger`] or a custom one through [`set_logger`]. Either
//! call may succeed once per process and should happen before the first
//! request is sent.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::{MakeWriter, SubscriberBuilder};

use crate::{ReqwrapError, Result};

/// Environment variable holding the log level (`error` .. `trace`).
pub const LOG_LEVEL_ENV: &str = "REQWRAP_LOG";
/// Environment variable holding a log file path.
pub const LOG_FILE_ENV: &str = "REQWRAP_LOG_FILE";

/// Line layout of the built-in subscriber.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Timestamp, level, target and fields on one line.
    #[default]
    Full,
    /// Shorter single-line layout.
    Compact,
    /// Multi-line, human oriented layout.
    Pretty,
}

/// Settings for [`configure_logger`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoggerConfig {
    /// Most verbose level that is recorded.
    pub level: Level,
    pub format: LogFormat,
    /// Prints the module path of each event.
    pub with_target: bool,
    /// Appends to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Full,
            with_target: true,
            file: None,
        }
    }
}

impl LoggerConfig {
    /// Reads [`LOG_LEVEL_ENV`] and [`LOG_FILE_ENV`], falling back to the
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var(LOG_LEVEL_ENV).ok(),
            std::env::var(LOG_FILE_ENV).ok(),
        )
    }

    fn from_values(level: Option<String>, file: Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(level) = level.filter(|value| !value.trim().is_empty()) {
            config.level = Level::from_str(level.trim()).map_err(|_| {
                ReqwrapError::Logger(format!("invalid {LOG_LEVEL_ENV} value '{level}'"))
            })?;
        }
        config.file = file
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Ok(config)
    }
}

/// Installs the built-in `tracing-subscriber` formatter as the global logger.
///
/// Fails with [`ReqwrapError::Logger`] if a global subscriber is already set
/// or the log file cannot be opened.
pub fn configure_logger(config: LoggerConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(config.with_target);

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| {
                    ReqwrapError::Logger(format!("cannot open {}: {err}", path.display()))
                })?;
            install(
                builder.with_ansi(false).with_writer(Mutex::new(file)),
                config.format,
            )
        }
        None => install(builder.with_writer(std::io::stderr), config.format),
    }
}

/// Installs a caller-supplied subscriber as the global logger.
pub fn set_logger<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| ReqwrapError::Logger(err.to_string()))
}

fn install<W>(
    builder: SubscriberBuilder<DefaultFields, Format, LevelFilter, W>,
    format: LogFormat,
) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let installed = match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|err| ReqwrapError::Logger(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tracing::Level;

    use super::{LogFormat, LoggerConfig};
    use crate::ReqwrapError;

    #[test]
    fn defaults_log_info_to_console() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.file.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let config = LoggerConfig::from_values(
            Some("debug".to_owned()),
            Some("/tmp/reqwrap.log".to_owned()),
        )
        .unwrap();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/reqwrap.log")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config =
            LoggerConfig::from_values(Some("  ".to_owned()), Some(String::new())).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = LoggerConfig::from_values(Some("loud".to_owned()), None).unwrap_err();
        assert!(matches!(err, ReqwrapError::Logger(_)));
    }
}
