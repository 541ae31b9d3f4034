//! Logging setup
//!
//! The subscriber is built from an explicit [`LogOptions`] value; this
//! module never reads the environment itself. Output goes to stderr so
//! stdout stays free for the invocation response.

use tracing::level_filters::LevelFilter;

use crate::error::{BackupError, BackupResult};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `JSON` means text
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LevelFilter,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: LevelFilter::DEBUG,
        }
    }
}

impl LogOptions {
    /// Build options from raw format and level names
    ///
    /// Unknown levels fall back to `debug`.
    pub fn from_names(format: &str, level: &str) -> Self {
        Self {
            format: LogFormat::from_name(format),
            level: parse_level(level).unwrap_or(LevelFilter::DEBUG),
        }
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::WARN),
        "fatal" | "panic" => Some(LevelFilter::ERROR),
        other => other.parse().ok(),
    }
}

/// Install the global subscriber described by `options`
pub fn init(options: &LogOptions) -> BackupResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(options.level)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match options.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    result.map_err(|e| BackupError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::from_name("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("TEXT"), LogFormat::Text);
        assert_eq!(LogFormat::from_name("xml"), LogFormat::Text);
        assert_eq!(LogFormat::from_name(""), LogFormat::Text);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(LogOptions::from_names("", "info").level, LevelFilter::INFO);
        assert_eq!(LogOptions::from_names("", "WARNING").level, LevelFilter::WARN);
        assert_eq!(LogOptions::from_names("", "fatal").level, LevelFilter::ERROR);
        assert_eq!(LogOptions::from_names("", "nonsense").level, LevelFilter::DEBUG);
    }

    #[test]
    fn test_defaults() {
        let options = LogOptions::default();
        assert_eq!(options.format, LogFormat::Text);
        assert_eq!(options.level, LevelFilter::DEBUG);
    }
}
