// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Engine-free [`Guest`] for exercising host functions.

use std::collections::HashMap;
use std::sync::Arc;

use eml_error::{codes, Error, Result};

use crate::callback::CallbackRegistry;
use crate::guest::Guest;
use crate::handle::Handle;
use crate::realm::Realm;
use crate::value::Value;

/// Closure standing in for a guest callback table entry
pub type TestCallback = Box<dyn Fn(&mut Realm, &[Value]) -> Result<Handle>>;

/// A guest backed by a plain byte vector with a bump allocator
pub struct MemoryGuest {
    realm:     Realm,
    memory:    Vec<u8>,
    next:      u32,
    callbacks: HashMap<u32, TestCallback>,
}

impl MemoryGuest {
    /// Default memory size: one wasm page
    pub const DEFAULT_MEMORY: usize = 65536;

    /// Create a guest whose realm is built from `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<CallbackRegistry>) -> Self {
        Self {
            realm:     Realm::new(registry),
            memory:    vec![0; Self::DEFAULT_MEMORY],
            next:      8,
            callbacks: HashMap::new(),
        }
    }

    /// Install a callback at `index` of the pretend function table
    pub fn register_callback<F>(&mut self, index: u32, f: F)
    where
        F: Fn(&mut Realm, &[Value]) -> Result<Handle> + 'static,
    {
        self.callbacks.insert(index, Box::new(f));
    }

    /// Write `text` into memory and return `(ptr, len)`
    pub fn put_str(&mut self, text: &str) -> Result<(u32, u32)> {
        let len = u32::try_from(text.len()).map_err(|_| Error::invalid_argument("string too large"))?;
        let ptr = self.alloc(len.max(1))?;
        self.write_memory(ptr, text.as_bytes())?;
        Ok((ptr, len))
    }

    /// Read a NUL-terminated string starting at `ptr`
    pub fn c_string_at(&self, ptr: u32) -> Result<String> {
        let start = ptr as usize;
        let tail = self.memory.get(start..).ok_or_else(|| Error::memory_out_of_bounds(ptr, 1))?;
        let end = tail.iter().position(|&b| b == 0).ok_or_else(|| Error::memory_out_of_bounds(ptr, 0))?;
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }

    fn range(&self, ptr: u32, len: u32) -> Result<core::ops::Range<usize>> {
        let start = ptr as usize;
        let end = start.checked_add(len as usize).filter(|&end| end <= self.memory.len());
        end.map(|end| start..end).ok_or_else(|| Error::memory_out_of_bounds(ptr, len))
    }
}

impl Default for MemoryGuest {
    fn default() -> Self {
        Self::with_registry(Arc::new(CallbackRegistry::new()))
    }
}

impl Guest for MemoryGuest {
    fn realm(&mut self) -> &mut Realm {
        &mut self.realm
    }

    fn read_memory(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>> {
        let range = self.range(ptr, len)?;
        Ok(self.memory[range].to_vec())
    }

    fn write_memory(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| Error::memory_out_of_bounds(ptr, u32::MAX))?;
        let range = self.range(ptr, len)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn alloc(&mut self, size: u32) -> Result<u32> {
        let ptr = self.next;
        let end = ptr.checked_add(size.max(1)).filter(|&end| end as usize <= self.memory.len());
        let Some(end) = end else {
            return Err(Error::resource_error(codes::ALLOCATION_FAILED, "test memory exhausted"));
        };
        self.next = (end + 7) & !7;
        Ok(ptr)
    }

    fn realloc(&mut self, ptr: u32, size: u32) -> Result<u32> {
        let new_ptr = self.alloc(size)?;
        let available = (self.memory.len() as u32).saturating_sub(ptr).min(size);
        let bytes = self.read_memory(ptr, available)?;
        self.write_memory(new_ptr, &bytes)?;
        Ok(new_ptr)
    }

    fn free(&mut self, _ptr: u32) -> Result<()> {
        Ok(())
    }

    fn call_callback(&mut self, index: u32, argv: Handle) -> Result<Handle> {
        let args = self.realm.arguments(argv)?;
        let callback = self.callbacks.get(&index).ok_or_else(|| {
            Error::runtime_trap(codes::CALLBACK_NOT_FOUND, format!("no callback at table index {index}"))
        })?;
        callback(&mut self.realm, &args)
    }
}
