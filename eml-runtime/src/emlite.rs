// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The standard import table for emlite-built modules.

use std::sync::Arc;

use eml_host::{register_env, CallbackRegistry};
use eml_logging::{register_console, stdio_handler, LogOperation, LoggingExt};

/// Builder for the import table handed to [`crate::Loader::instantiate`].
///
/// Starts with the full `env` table, a `console` object on every realm, and
/// console output written to stdout/stderr.
#[derive(Debug)]
pub struct Emlite {
    registry: CallbackRegistry,
}

impl Emlite {
    /// The default import table
    #[must_use]
    pub fn new() -> Self {
        let mut registry = CallbackRegistry::new();
        register_env(&mut registry);
        register_console(&mut registry);
        registry.register_log_handler(stdio_handler());
        Self { registry }
    }

    /// Send console output to `handler` instead of stdout/stderr
    #[must_use]
    pub fn with_log_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(LogOperation) + Send + Sync + 'static,
    {
        self.registry.register_log_handler(handler);
        self
    }

    /// Registry access for adding host functions or realm setup hooks
    pub fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.registry
    }

    /// Freeze the table for sharing between instances
    #[must_use]
    pub fn imports(self) -> Arc<CallbackRegistry> {
        Arc::new(self.registry)
    }
}

impl Default for Emlite {
    fn default() -> Self {
        Self::new()
    }
}
