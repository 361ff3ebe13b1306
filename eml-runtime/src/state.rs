// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Per-instance host state and the host -> module capability table.

use eml_error::{codes, Error, Result};
use eml_host::{Guest, Handle, Realm};
use wasmtime::{AsContextMut, Caller, Memory, Ref, Store, Table, TypedFunc};

use crate::allocator::{AllocatorMemory, HostAllocator, PAGE_SIZE};
use crate::trap;

/// Name of the exported callback table
pub const FUNCTION_TABLE_EXPORT: &str = "__indirect_function_table";
/// Name of the exported linear memory
pub const MEMORY_EXPORT: &str = "memory";
/// Name of the exported allocator
pub const MALLOC_EXPORT: &str = "malloc";

/// Exports the host calls back into, captured by `bind_exports`
#[derive(Clone)]
pub struct ExportBindings {
    /// Linear memory
    pub memory: Option<Memory>,
    /// The module's own allocator
    pub malloc: Option<TypedFunc<u32, u32>>,
    /// Table holding callbacks made with `emlite_val_make_callback`
    pub table:  Option<Table>,
    /// Every export name, in declaration order
    pub names:  Vec<String>,
}

impl core::fmt::Debug for ExportBindings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExportBindings")
            .field("memory", &self.memory.is_some())
            .field("malloc", &self.malloc.is_some())
            .field("table", &self.table.is_some())
            .field("names", &self.names)
            .finish()
    }
}

/// Data stored in each instance's store
#[derive(Debug)]
pub struct HostState {
    /// Host values visible to the instance
    pub realm:            Realm,
    /// Bound exports, `None` until `bind_exports`
    pub exports:          Option<ExportBindings>,
    /// Allocator serving `emlite_malloc`
    pub allocator:        HostAllocator,
    /// Memory growth limit in pages
    pub max_memory_pages: u32,
}

impl HostState {
    /// Fresh state around `realm`
    #[must_use]
    pub fn new(realm: Realm, max_memory_pages: u32) -> Self {
        Self { realm, exports: None, allocator: HostAllocator::default(), max_memory_pages }
    }
}

/// Store access shared by host function calls and host-initiated calls
pub trait HostContext: AsContextMut<Data = HostState> {
    /// The host state
    fn state_mut(&mut self) -> &mut HostState;
}

impl HostContext for Caller<'_, HostState> {
    fn state_mut(&mut self) -> &mut HostState {
        self.data_mut()
    }
}

impl HostContext for Store<HostState> {
    fn state_mut(&mut self) -> &mut HostState {
        self.data_mut()
    }
}

/// [`Guest`] implementation over a wasmtime store
pub struct GuestContext<'a, C: HostContext> {
    ctx: &'a mut C,
}

impl<'a, C: HostContext> GuestContext<'a, C> {
    /// Wrap a caller or store
    pub fn new(ctx: &'a mut C) -> Self {
        Self { ctx }
    }

    fn bindings(&mut self) -> Result<&ExportBindings> {
        self.ctx
            .state_mut()
            .exports
            .as_ref()
            .ok_or_else(|| Error::invalid_state("module exports are not bound yet"))
    }

    fn memory(&mut self) -> Result<Memory> {
        self.bindings()?.memory.ok_or_else(|| {
            Error::memory_error(codes::MEMORY_NOT_FOUND, format!("module does not export `{MEMORY_EXPORT}`"))
        })
    }

    fn range(&mut self, memory: Memory, ptr: u32, len: u32) -> Result<core::ops::Range<usize>> {
        let size = memory.data_size(&mut *self.ctx);
        let start = ptr as usize;
        start
            .checked_add(len as usize)
            .filter(|&end| end <= size)
            .map(|end| start..end)
            .ok_or_else(|| Error::memory_out_of_bounds(ptr, len))
    }

    fn with_allocator<T>(&mut self, f: impl FnOnce(&mut HostAllocator, &mut Self) -> Result<T>) -> Result<T> {
        let mut allocator = core::mem::take(&mut self.ctx.state_mut().allocator);
        let result = f(&mut allocator, self);
        self.ctx.state_mut().allocator = allocator;
        result
    }
}

impl<C: HostContext> AllocatorMemory for GuestContext<'_, C> {
    fn grow_pages(&mut self, pages: u32) -> Result<u32> {
        let memory = self.memory()?;
        let max = u64::from(self.ctx.state_mut().max_memory_pages);
        let current = memory.size(&mut *self.ctx);
        if current + u64::from(pages) > max {
            return Err(Error::resource_error(
                codes::RESOURCE_LIMIT_EXCEEDED,
                format!("growing memory by {pages} pages would exceed the limit of {max} pages"),
            ));
        }
        let old = memory
            .grow(&mut *self.ctx, u64::from(pages))
            .map_err(|e| Error::memory_error(codes::MEMORY_GROW_ERROR, format!("{e:#}")))?;
        u32::try_from(old * u64::from(PAGE_SIZE))
            .map_err(|_| Error::memory_error(codes::MEMORY_GROW_ERROR, "memory exceeds 32-bit address space"))
    }

    fn copy_within(&mut self, from: u32, to: u32, len: u32) -> Result<()> {
        let memory = self.memory()?;
        let source = self.range(memory, from, len)?;
        let target = self.range(memory, to, len)?;
        memory.data_mut(&mut *self.ctx).copy_within(source, target.start);
        Ok(())
    }
}

impl<C: HostContext> Guest for GuestContext<'_, C> {
    fn realm(&mut self) -> &mut Realm {
        &mut self.ctx.state_mut().realm
    }

    fn read_memory(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>> {
        let memory = self.memory()?;
        let range = self.range(memory, ptr, len)?;
        Ok(memory.data(&*self.ctx)[range].to_vec())
    }

    fn write_memory(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let memory = self.memory()?;
        let len = u32::try_from(bytes.len()).map_err(|_| Error::memory_out_of_bounds(ptr, u32::MAX))?;
        let range = self.range(memory, ptr, len)?;
        memory.data_mut(&mut *self.ctx)[range].copy_from_slice(bytes);
        Ok(())
    }

    fn alloc(&mut self, size: u32) -> Result<u32> {
        self.with_allocator(|allocator, guest| allocator.alloc(size, guest))
    }

    fn realloc(&mut self, ptr: u32, size: u32) -> Result<u32> {
        self.with_allocator(|allocator, guest| allocator.realloc(ptr, size, guest))
    }

    fn free(&mut self, ptr: u32) -> Result<()> {
        self.with_allocator(|allocator, _| allocator.free(ptr))
    }

    fn alloc_for_guest(&mut self, size: u32) -> Result<u32> {
        match self.bindings()?.malloc.clone() {
            Some(malloc) => malloc.call(&mut *self.ctx, size).map_err(|e| trap::from_wasmtime(&e)),
            None => self.alloc(size),
        }
    }

    fn call_callback(&mut self, index: u32, argv: Handle) -> Result<Handle> {
        let table = self.bindings()?.table.ok_or_else(|| {
            Error::invalid_state(format!("module does not export `{FUNCTION_TABLE_EXPORT}`"))
        })?;
        let func = match table.get(&mut *self.ctx, index.into()) {
            Some(Ref::Func(Some(func))) => func,
            Some(_) => {
                return Err(Error::runtime_trap(
                    codes::CALLBACK_NOT_FOUND,
                    format!("table entry {index} is not a function"),
                ));
            }
            None => {
                return Err(Error::runtime_trap(
                    codes::CALLBACK_NOT_FOUND,
                    format!("callback index {index} is out of range"),
                ));
            }
        };
        let callback = func.typed::<u32, u32>(&*self.ctx).map_err(|_| {
            Error::runtime_trap(codes::CALLBACK_NOT_FOUND, format!("callback {index} is not of type (i32) -> i32"))
        })?;
        callback.call(&mut *self.ctx, argv).map_err(|e| trap::from_wasmtime(&e))
    }
}
