// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Callback registry for host functions.
//!
//! The registry is the module -> host capability table: it holds every host
//! function a module may import, plus typed callbacks other crates hang off
//! it (realm setup hooks, log handlers).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use eml_error::{kinds, Result};

use crate::function::{HostFunction, WasmValue};
use crate::guest::Guest;
use crate::realm::Realm;

/// Types of callbacks that can be registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallbackType {
    /// Hooks run on every new realm
    Setup,
    /// Callback for logging
    Logging,
}

/// Hook run on every realm created from a registry
pub type RealmSetup = Arc<dyn Fn(&mut Realm) + Send + Sync>;

/// A callback registry for handling module imports
#[derive(Default)]
pub struct CallbackRegistry {
    /// Generic callback storage for different types of callbacks
    callbacks: HashMap<CallbackType, Box<dyn Any + Send + Sync>>,

    /// Host functions registry (module name -> function name -> function)
    host_functions: HashMap<String, HashMap<String, HostFunction>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered_callbacks", &self.callbacks.keys())
            .field("registered_modules", &self.host_functions.keys())
            .finish()
    }
}

impl CallbackRegistry {
    /// Create a new callback registry
    #[must_use]
    pub fn new() -> Self {
        Self { callbacks: HashMap::new(), host_functions: HashMap::new() }
    }

    /// Register a callback
    pub fn register_callback<T: 'static + Send + Sync>(
        &mut self,
        callback_type: CallbackType,
        callback: T,
    ) {
        self.callbacks.insert(callback_type, Box::new(callback));
    }

    /// Get a callback
    pub fn get_callback<T: 'static + Send + Sync>(
        &self,
        callback_type: &CallbackType,
    ) -> Option<&T> {
        self.callbacks.get(callback_type).and_then(|cb| cb.downcast_ref())
    }

    /// Get a mutable callback
    pub fn get_callback_mut<T: 'static + Send + Sync>(
        &mut self,
        callback_type: &CallbackType,
    ) -> Option<&mut T> {
        self.callbacks.get_mut(callback_type).and_then(|cb| cb.downcast_mut())
    }

    /// Add a hook run on every realm created from this registry
    pub fn add_realm_setup<F>(&mut self, setup: F)
    where
        F: Fn(&mut Realm) + Send + Sync + 'static,
    {
        let setup: RealmSetup = Arc::new(setup);
        if let Some(setups) = self.get_callback_mut::<Vec<RealmSetup>>(&CallbackType::Setup) {
            setups.push(setup);
        } else {
            self.register_callback(CallbackType::Setup, vec![setup]);
        }
    }

    /// Realm setup hooks in registration order
    #[must_use]
    pub fn realm_setups(&self) -> Vec<RealmSetup> {
        self.get_callback::<Vec<RealmSetup>>(&CallbackType::Setup).cloned().unwrap_or_default()
    }

    /// Register a host function
    pub fn register_host_function(
        &mut self,
        module_name: &str,
        function_name: &str,
        function: HostFunction,
    ) {
        let module_name = module_name.to_string();
        let function_name = function_name.to_string();

        let module_functions = self.host_functions.entry(module_name).or_default();
        module_functions.insert(function_name, function);
    }

    /// Check if a host function is registered
    #[must_use]
    pub fn has_host_function(&self, module_name: &str, function_name: &str) -> bool {
        self.host_function(module_name, function_name).is_some()
    }

    /// Look up a host function
    #[must_use]
    pub fn host_function(&self, module_name: &str, function_name: &str) -> Option<&HostFunction> {
        self.host_functions.get(module_name).and_then(|funcs| funcs.get(function_name))
    }

    /// Call a host function
    ///
    /// # Errors
    ///
    /// Returns an error if the host function is not found or fails during
    /// execution
    pub fn call_host_function(
        &self,
        guest: &mut dyn Guest,
        module_name: &str,
        function_name: &str,
        args: &[WasmValue],
    ) -> Result<Vec<WasmValue>> {
        match self.host_function(module_name, function_name) {
            Some(function) => function.call(guest, args),
            None => Err(kinds::host_function_not_found(module_name, function_name)),
        }
    }

    /// Get all registered module names, sorted
    #[must_use]
    pub fn get_registered_modules(&self) -> Vec<&String> {
        let mut modules: Vec<&String> = self.host_functions.keys().collect();
        modules.sort();
        modules
    }

    /// Get all registered function names for a module, sorted
    #[must_use]
    pub fn get_registered_functions(&self, module_name: &str) -> Vec<&String> {
        let mut functions: Vec<&String> = self
            .host_functions
            .get(module_name)
            .map(|module_functions| module_functions.keys().collect())
            .unwrap_or_default();
        functions.sort();
        functions
    }
}

/// Generate a unique function key from module and function names
///
/// # Returns
///
/// A string in the format `module_name::function_name`
#[must_use]
pub fn function_key(module_name: &str, function_name: &str) -> String {
    format!("{module_name}::{function_name}")
}
