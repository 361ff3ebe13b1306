// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Loader configuration.

use std::path::PathBuf;

/// Default entry point export
pub const DEFAULT_ENTRY_POINT: &str = "main";
/// Default cap on module image size (64 MiB)
pub const DEFAULT_MAX_MODULE_BYTES: usize = 64 * 1024 * 1024;
/// Default cap on host-driven memory growth (1 GiB)
pub const DEFAULT_MAX_MEMORY_PAGES: u32 = 16 * 1024;

/// Settings shared by every stage of the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Fuel available to each guest call; `None` runs unbounded
    pub fuel:             Option<u64>,
    /// Images larger than this are rejected before compilation
    pub max_module_bytes: usize,
    /// Linear memory size, in pages, the host allocator may grow to
    pub max_memory_pages: u32,
    /// Export invoked by [`crate::Loader::run`]
    pub entry_point:      String,
    /// Base for relative module locations
    pub base_dir:         Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fuel:             None,
            max_module_bytes: DEFAULT_MAX_MODULE_BYTES,
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
            entry_point:      DEFAULT_ENTRY_POINT.to_string(),
            base_dir:         None,
        }
    }
}

impl LoaderConfig {
    /// Bound every guest call by `fuel` units
    #[must_use]
    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = Some(fuel);
        self
    }

    /// Set the image size limit
    #[must_use]
    pub fn with_max_module_bytes(mut self, max: usize) -> Self {
        self.max_module_bytes = max;
        self
    }

    /// Set the memory growth limit
    #[must_use]
    pub fn with_max_memory_pages(mut self, pages: u32) -> Self {
        self.max_memory_pages = pages;
        self
    }

    /// Set the entry point export
    #[must_use]
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    /// Resolve relative locations against `dir`
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}
