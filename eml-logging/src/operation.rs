//! A single console call from a module.

use crate::level::LogLevel;

/// Log operation raised by a module through `console`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOperation {
    /// Log level
    pub level:   LogLevel,
    /// Log message, console arguments joined by spaces
    pub message: String,
    /// Label of the realm that logged (optional)
    pub source:  Option<String>,
}

impl LogOperation {
    /// Create a new log operation
    #[must_use]
    pub const fn new(level: LogLevel, message: String) -> Self {
        Self { level, message, source: None }
    }

    /// Create a new log operation with a source label
    pub fn with_source<S1: Into<String>, S2: Into<String>>(
        level: LogLevel,
        message: S1,
        source: S2,
    ) -> Self {
        Self { level, message: message.into(), source: Some(source.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_operation_creation() {
        let op = LogOperation::new(LogLevel::Info, "test message".to_string());
        assert_eq!(op.level, LogLevel::Info);
        assert_eq!(op.message, "test message");
        assert!(op.source.is_none());

        let op = LogOperation::with_source(LogLevel::Debug, "test message", "eval.wasm");
        assert_eq!(op.level, LogLevel::Debug);
        assert_eq!(op.source.as_deref(), Some("eval.wasm"));
    }
}
