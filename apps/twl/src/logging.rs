//! Diagnostic logging for the twl launcher.
//!
//! Logging is configured from two environment variables:
//!
//! - `LOG_LEVEL`: `debug`, `info`, `warn` or `error` (case-sensitive).
//!   Unset or unrecognised values mean `info`.
//! - `LOG_OUTPUT`: `json` for structured output, anything else for text.
//!
//! Log lines go to stderr so they never mix with the tailwindcss output that
//! twl relays on stdout.

use tracing::Level;

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Environment variable selecting the log format.
pub const LOG_OUTPUT_ENV: &str = "LOG_OUTPUT";

/// Verbosity of diagnostic logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a `LOG_LEVEL` value. Unknown values map to [`LogLevel::Info`].
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        match value {
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Converts to the corresponding `tracing` level.
    #[must_use]
    pub fn to_tracing(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

/// Format of diagnostic logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Text,
    Json,
}

impl LogOutput {
    /// Parses a `LOG_OUTPUT` value. Unknown values map to [`LogOutput::Text`].
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Reads `LOG_LEVEL` from the environment.
#[must_use]
pub fn level_from_env() -> LogLevel {
    std::env::var(LOG_LEVEL_ENV).map_or(LogLevel::Info, |v| LogLevel::from_env_value(&v))
}

/// Reads `LOG_OUTPUT` from the environment.
#[must_use]
pub fn output_from_env() -> LogOutput {
    std::env::var(LOG_OUTPUT_ENV).map_or(LogOutput::Text, |v| LogOutput::from_env_value(&v))
}

/// Installs the global subscriber. Calling it twice is harmless; the second
/// call keeps the first subscriber.
pub fn init(level: LogLevel, output: LogOutput) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level.to_tracing())
        .with_writer(std::io::stderr)
        .with_target(false);

    // An already-installed subscriber (e.g. from a test harness) wins.
    let _ = match output {
        LogOutput::Json => builder.json().try_init(),
        LogOutput::Text => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn level_parsing_is_case_sensitive() {
        let cases = [
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
            ("invalid", LogLevel::Info),
            ("", LogLevel::Info),
            ("DEBUG", LogLevel::Info),
        ];
        for (input, expected) in cases {
            assert_eq!(LogLevel::from_env_value(input), expected, "{input:?}");
        }
    }

    #[test]
    fn output_parsing_defaults_to_text() {
        assert_eq!(LogOutput::from_env_value("json"), LogOutput::Json);
        assert_eq!(LogOutput::from_env_value("text"), LogOutput::Text);
        assert_eq!(LogOutput::from_env_value("invalid"), LogOutput::Text);
        assert_eq!(LogOutput::from_env_value(""), LogOutput::Text);
    }

    #[test]
    fn levels_map_to_tracing() {
        assert_eq!(LogLevel::Debug.to_tracing(), Level::DEBUG);
        assert_eq!(LogLevel::Info.to_tracing(), Level::INFO);
        assert_eq!(LogLevel::Warn.to_tracing(), Level::WARN);
        assert_eq!(LogLevel::Error.to_tracing(), Level::ERROR);
    }

    #[test]
    #[serial_test::serial]
    fn settings_read_from_environment() {
        // SAFETY: This test runs serially and we restore the env vars at the end.
        unsafe {
            env::set_var(LOG_LEVEL_ENV, "debug");
            env::set_var(LOG_OUTPUT_ENV, "json");
        }

        let level = level_from_env();
        let output = output_from_env();

        // SAFETY: Cleanup - restoring previous state
        unsafe {
            env::remove_var(LOG_LEVEL_ENV);
            env::remove_var(LOG_OUTPUT_ENV);
        }

        assert_eq!(level, LogLevel::Debug);
        assert_eq!(output, LogOutput::Json);
        assert_eq!(level_from_env(), LogLevel::Info);
        assert_eq!(output_from_env(), LogOutput::Text);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(LogLevel::Error, LogOutput::Text);
        init(LogLevel::Debug, LogOutput::Json);
    }
}
