// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Handle table mapping 32-bit handles to host values.

use eml_error::{Error, Result};

use crate::value::Value;

/// Opaque reference to a host value, as seen by the module
pub type Handle = u32;

/// Handle of `null`
pub const NULL: Handle = 0;
/// Handle of `undefined`
pub const UNDEFINED: Handle = 1;
/// Handle of `false`
pub const FALSE: Handle = 2;
/// Handle of `true`
pub const TRUE: Handle = 3;
/// Handle of the global object
pub const GLOBAL_THIS: Handle = 4;
/// First handle handed out for non-reserved values
pub const FIRST_DYNAMIC: Handle = 5;

/// Slot table of live handles.
///
/// Reserved handles are never stored in `slots`; slot `i` holds handle
/// `FIRST_DYNAMIC + i`.
#[derive(Debug)]
pub struct HandleTable {
    slots:  Vec<Option<Value>>,
    free:   Vec<Handle>,
    global: Value,
}

impl HandleTable {
    /// Create a table whose [`GLOBAL_THIS`] handle names `global`
    #[must_use]
    pub fn new(global: Value) -> Self {
        Self { slots: Vec::new(), free: Vec::new(), global }
    }

    /// Return a handle for `value`, interning the reserved values
    pub fn insert(&mut self, value: Value) -> Handle {
        match &value {
            Value::Null => return NULL,
            Value::Undefined => return UNDEFINED,
            Value::Bool(false) => return FALSE,
            Value::Bool(true) => return TRUE,
            _ if value.strict_equals(&self.global) => return GLOBAL_THIS,
            _ => {}
        }

        if let Some(handle) = self.free.pop() {
            self.slots[Self::slot(handle)] = Some(value);
            return handle;
        }
        self.slots.push(Some(value));
        FIRST_DYNAMIC + (self.slots.len() as Handle - 1)
    }

    /// The value named by `handle`
    pub fn get(&self, handle: Handle) -> Result<Value> {
        match handle {
            NULL => Ok(Value::Null),
            UNDEFINED => Ok(Value::Undefined),
            FALSE => Ok(Value::Bool(false)),
            TRUE => Ok(Value::Bool(true)),
            GLOBAL_THIS => Ok(self.global.clone()),
            _ => self
                .slots
                .get(Self::slot(handle))
                .and_then(Option::clone)
                .ok_or_else(|| Error::invalid_handle(handle)),
        }
    }

    /// Release `handle`. Reserved and unknown handles are ignored.
    pub fn remove(&mut self, handle: Handle) {
        if handle < FIRST_DYNAMIC {
            return;
        }
        if let Some(slot) = self.slots.get_mut(Self::slot(handle)) {
            if slot.take().is_some() {
                self.free.push(handle);
            }
        }
    }

    /// Number of live non-reserved handles
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn slot(handle: Handle) -> usize {
        handle.saturating_sub(FIRST_DYNAMIC) as usize
    }
}
