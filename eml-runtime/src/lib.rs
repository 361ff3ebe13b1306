//! # EML Runtime
//!
//! Loads emlite-built WebAssembly modules and runs them against the host
//! value realm.
//!
//! The pipeline has five stages, each available on its own:
//!
//! | Stage                              | Produces           |
//! |------------------------------------|--------------------|
//! | [`Loader::load_bytes`]             | [`ModuleImage`]    |
//! | [`Loader::compile`]                | [`CompiledModule`] |
//! | [`Loader::instantiate`]            | [`ModuleInstance`] |
//! | [`Loader::bind_exports`]           | bound memory, table and allocator |
//! | [`Loader::invoke_entry_point`]     | the entry point's side effects |
//!
//! [`Loader::run`] chains them for a module location and the configured
//! entry point.
//!
//! ```no_run
//! use eml_runtime::{Emlite, Loader, LoaderConfig};
//!
//! # fn main() -> eml_runtime::Result<()> {
//! let mut loader = Loader::new(LoaderConfig::default().with_fuel(1_000_000))?;
//! let instance = loader.run("file://app.wasm", &Emlite::new().imports())?;
//! println!("{}", instance.name());
//! # Ok(())
//! # }
//! ```

// EML - eml-runtime
// Module: Module Loader
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use eml_error::{Error, ErrorCategory, Result};

/// Host-managed allocation inside guest memory.
pub mod allocator;
/// Loader configuration.
pub mod config;
/// The default import table.
pub mod emlite;
/// Instantiated modules.
pub mod instance;
/// The loading pipeline.
pub mod loader;
/// Module locations.
pub mod location;
/// Per-instance host state.
pub mod state;
/// Pipeline counters.
pub mod stats;
mod trap;

pub use allocator::HostAllocator;
pub use config::LoaderConfig;
pub use emlite::Emlite;
pub use instance::ModuleInstance;
pub use loader::{CompiledModule, Loader, ModuleImage};
pub use location::ModuleLocation;
pub use state::{ExportBindings, GuestContext, HostContext, HostState};
pub use stats::LoaderStats;
