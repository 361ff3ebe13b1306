// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instantiated modules.

use eml_error::{codes, Error, ErrorCategory, Result};
use eml_host::{interop, Function, Realm, Value};
use wasmtime::{Instance, Store};

use crate::state::{ExportBindings, GuestContext, HostState};

/// A module instance together with its store
pub struct ModuleInstance {
    pub(crate) store:    Store<HostState>,
    pub(crate) instance: Instance,
    pub(crate) name:     String,
    pub(crate) fuel:     Option<u64>,
}

impl ModuleInstance {
    /// Name of the image this instance was created from
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Export names, in declaration order
    pub fn exports(&mut self) -> Vec<String> {
        self.instance.exports(&mut self.store).map(|export| export.name().to_string()).collect()
    }

    /// Bindings captured by `bind_exports`, if it ran
    #[must_use]
    pub fn bindings(&self) -> Option<&ExportBindings> {
        self.store.data().exports.as_ref()
    }

    /// Host values visible to this instance
    pub fn realm(&mut self) -> &mut Realm {
        &mut self.store.data_mut().realm
    }

    /// Call a guest callback created with `emlite_val_make_callback`.
    ///
    /// Requires bound exports; failures are reported as runtime traps.
    pub fn call_callback(&mut self, index: u32, args: &[Value]) -> Result<Value> {
        self.refuel()?;
        let callback = Value::from(Function::guest(index));
        let mut guest = GuestContext::new(&mut self.store);
        interop::call(&mut guest, &callback, Value::Undefined, args)
            .map_err(|e| e.recategorize(ErrorCategory::RuntimeTrap))
    }

    /// Reset the store's fuel to the configured budget
    pub(crate) fn refuel(&mut self) -> Result<()> {
        if let Some(fuel) = self.fuel {
            self.store
                .set_fuel(fuel)
                .map_err(|e| Error::runtime_trap(codes::TRAP, format!("cannot set fuel: {e:#}")))?;
        }
        Ok(())
    }

    /// Fuel spent since the last [`ModuleInstance::refuel`]
    pub(crate) fn consumed_fuel(&self) -> u64 {
        match self.fuel {
            Some(fuel) => fuel.saturating_sub(self.store.get_fuel().unwrap_or(0)),
            None => 0,
        }
    }
}

impl core::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("name", &self.name)
            .field("fuel", &self.fuel)
            .field("bindings", &self.bindings())
            .finish_non_exhaustive()
    }
}
