//! Log handlers for module console output.
//!
//! A [`CallbackRegistry`] holds at most one log handler, stored under
//! [`CallbackType::Logging`]. Console calls from every realm built from that
//! registry end up there.

use std::io::Write;

use eml_host::{CallbackRegistry, CallbackType};

use crate::level::LogLevel;
use crate::operation::LogOperation;

/// Function type for handling log operations
pub type LogHandler = Box<dyn Fn(LogOperation) + Send + Sync>;

/// Extension trait for `CallbackRegistry` to add logging-specific methods
pub trait LoggingExt {
    /// Register a log handler, replacing any previous one
    fn register_log_handler<F>(&mut self, handler: F)
    where
        F: Fn(LogOperation) + Send + Sync + 'static;

    /// Handle a log operation
    fn handle_log(&self, operation: LogOperation);

    /// Check if a log handler is registered
    fn has_log_handler(&self) -> bool;
}

impl LoggingExt for CallbackRegistry {
    fn register_log_handler<F>(&mut self, handler: F)
    where
        F: Fn(LogOperation) + Send + Sync + 'static,
    {
        self.register_callback(CallbackType::Logging, Box::new(handler) as LogHandler);
    }

    fn handle_log(&self, operation: LogOperation) {
        if let Some(handler) = self.get_callback::<LogHandler>(&CallbackType::Logging) {
            handler(operation);
        }
    }

    fn has_log_handler(&self) -> bool {
        self.get_callback::<LogHandler>(&CallbackType::Logging).is_some()
    }
}

/// Handler printing messages the way a JavaScript console does: warnings
/// and errors to stderr, everything else to stdout
pub fn stdio_handler() -> impl Fn(LogOperation) + Send + Sync + 'static {
    |operation: LogOperation| {
        // Console output is best effort; a closed pipe must not trap the module.
        let _ = if operation.level >= LogLevel::Warn {
            writeln!(std::io::stderr().lock(), "{}", operation.message)
        } else {
            writeln!(std::io::stdout().lock(), "{}", operation.message)
        };
    }
}

/// Handler forwarding messages to `tracing` at the matching level
pub fn tracing_handler() -> impl Fn(LogOperation) + Send + Sync + 'static {
    |operation: LogOperation| {
        let source = operation.source.as_deref().unwrap_or("module");
        let message = &operation.message;
        match operation.level {
            LogLevel::Trace => tracing::trace!(target: "eml::console", "[{source}] {message}"),
            LogLevel::Debug => tracing::debug!(target: "eml::console", "[{source}] {message}"),
            LogLevel::Info => tracing::info!(target: "eml::console", "[{source}] {message}"),
            LogLevel::Warn => tracing::warn!(target: "eml::console", "[{source}] {message}"),
            LogLevel::Error | LogLevel::Critical => {
                tracing::error!(target: "eml::console", "[{source}] {message}");
            }
        }
    }
}
