//! # EML Logging
//!
//! Console output for emlite modules.
//!
//! Modules log through the `console` global of their realm. This crate
//! installs that global and routes each call to the log handler registered
//! on the host's [`CallbackRegistry`]: plain stdio like a JavaScript
//! console, or `tracing` events for hosts that run a subscriber.

// EML - eml-logging
// Module: Console Logging
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)] // Rule 2
#![warn(missing_docs)]

// Reexports for convenience
pub use eml_error::{Error, Result};
pub use eml_host::CallbackRegistry;

/// The `console` global installed into every realm.
pub mod console;

/// Logging handlers for processing log messages.
///
/// This module contains the registry extension trait and the stock
/// handlers used by the command line host.
pub mod handler;

/// Log level definitions for categorizing message severity.
pub mod level;

/// Log operation data structures.
pub mod operation;

// Reexport types
pub use console::{install_console, register_console};
pub use handler::{stdio_handler, tracing_handler, LogHandler, LoggingExt};
pub use level::LogLevel;
pub use operation::LogOperation;
