//! Logging setup. Library code only uses `tracing` macros; binaries call
//! [`init`] once. Output always goes to stderr so stdout stays reserved for
//! predictions and reports.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::common::error::ReimburseError;

/// Line format of emitted log events.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Human readable single-line events.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ReimburseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ReimburseError::config(format!(
                "unknown log format `{other}` (expected text or json)"
            ))),
        }
    }
}

/// Install the global subscriber. Invalid filter directives fall back to `warn`.
/// Calling this twice is harmless; the second install is ignored.
pub fn init(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
