// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Counters kept by the loader across runs.

use core::fmt;

/// Pipeline statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Images read from disk
    pub images_loaded:        u64,
    /// Bytes read from disk
    pub bytes_read:           u64,
    /// Images compiled
    pub modules_compiled:     u64,
    /// Instances created
    pub instances_created:    u64,
    /// Exports captured by `bind_exports`
    pub exports_bound:        u64,
    /// Entry points invoked
    pub entry_points_invoked: u64,
    /// Fuel consumed by guest calls (0 without a fuel limit)
    pub fuel_consumed:        u64,
}

impl fmt::Display for LoaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Loader Statistics ===")?;
        writeln!(f, "Images loaded:        {}", self.images_loaded)?;
        writeln!(f, "Bytes read:           {}", self.bytes_read)?;
        writeln!(f, "Modules compiled:     {}", self.modules_compiled)?;
        writeln!(f, "Instances created:    {}", self.instances_created)?;
        writeln!(f, "Exports bound:        {}", self.exports_bound)?;
        writeln!(f, "Entry points invoked: {}", self.entry_points_invoked)?;
        write!(f, "Fuel consumed:        {}", self.fuel_consumed)
    }
}
