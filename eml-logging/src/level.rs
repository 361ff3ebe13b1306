//! Log level definitions for module console output.

use core::fmt;
use core::str::FromStr;

/// Log levels for module console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Trace-level messages (`console.trace`)
    Trace,
    /// Debug-level messages (`console.debug`)
    Debug,
    /// Informational messages (`console.log`, `console.info`)
    Info,
    /// Warning messages (`console.warn`)
    Warn,
    /// Error messages (`console.error`)
    Error,
    /// Critical error messages (severe issues)
    Critical,
}

/// Error returned when a string names no log level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLogLevelError {
    /// The string that failed to parse
    pub invalid_level: String,
}

impl fmt::Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.invalid_level)
    }
}

impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" | "log" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLogLevelError { invalid_level: s.to_string() }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LogLevel {
    /// Creates a `LogLevel` from a string, defaulting to Info for invalid
    /// levels
    #[must_use]
    pub fn from_string_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Info)
    }

    /// Convert `LogLevel` to a string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("log".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("critical".parse::<LogLevel>().unwrap(), LogLevel::Critical);

        // Case insensitive
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);

        assert!("".parse::<LogLevel>().is_err());
        let err = "invalid".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.invalid_level, "invalid");
        assert_eq!(err.to_string(), "Invalid log level: invalid");
    }

    #[test]
    fn test_log_level_from_string_or_default() {
        assert_eq!(LogLevel::from_string_or_default("trace"), LogLevel::Trace);
        assert_eq!(LogLevel::from_string_or_default("error"), LogLevel::Error);
        assert_eq!(LogLevel::from_string_or_default("invalid"), LogLevel::Info);
        assert_eq!(LogLevel::from_string_or_default(""), LogLevel::Info);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Critical.to_string(), "critical");
    }
}
