// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host -> module capabilities.
//!
//! A [`Guest`] is what a host function sees of the module that called it:
//! the realm holding host values, the module's linear memory, its
//! allocator, and its callback table. The engine crate implements it on top
//! of the bound export table; `testing::MemoryGuest`, behind the `testing`
//! feature, implements it over a plain byte vector.

use eml_error::{Error, Result};

use crate::handle::Handle;
use crate::realm::Realm;

/// Capabilities the host holds on the module it is serving
pub trait Guest {
    /// The realm of host values visible to this module
    fn realm(&mut self) -> &mut Realm;

    /// Copy `len` bytes out of linear memory starting at `ptr`
    fn read_memory(&mut self, ptr: u32, len: u32) -> Result<Vec<u8>>;

    /// Copy `bytes` into linear memory starting at `ptr`
    fn write_memory(&mut self, ptr: u32, bytes: &[u8]) -> Result<()>;

    /// Allocate `size` bytes from the host-side allocator
    fn alloc(&mut self, size: u32) -> Result<u32>;

    /// Resize a block previously returned by [`Guest::alloc`]
    fn realloc(&mut self, ptr: u32, size: u32) -> Result<u32>;

    /// Release a block previously returned by [`Guest::alloc`]
    fn free(&mut self, ptr: u32) -> Result<()>;

    /// Allocate memory the module will own, preferring its own allocator
    /// when it exports one.
    fn alloc_for_guest(&mut self, size: u32) -> Result<u32> {
        self.alloc(size)
    }

    /// Run the guest callback stored at `index` in the module's function
    /// table, passing the handle of an argument array.
    fn call_callback(&mut self, index: u32, argv: Handle) -> Result<Handle>;

    /// Read a UTF-8 string (lossily) from linear memory
    fn read_str(&mut self, ptr: u32, len: u32) -> Result<String> {
        let bytes = self.read_memory(ptr, len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Copy `text` into freshly allocated guest memory as a NUL-terminated
    /// string and return its address
    fn write_c_string(&mut self, text: &str) -> Result<u32> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        let len = u32::try_from(bytes.len())
            .map_err(|_| Error::invalid_argument("string too large for guest memory"))?;
        let ptr = self.alloc_for_guest(len)?;
        self.write_memory(ptr, &bytes)?;
        Ok(ptr)
    }
}
