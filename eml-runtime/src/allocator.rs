// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host-side allocator behind `emlite_malloc`, `emlite_realloc` and
//! `emlite_free`.
//!
//! Blocks are carved from pages the host grows onto the end of linear
//! memory, so they never overlap memory the module manages itself.

use std::collections::HashMap;

use eml_error::{codes, Error, Result};

/// Size of a wasm page in bytes
pub const PAGE_SIZE: u32 = 65536;

/// Alignment of every block
pub const ALIGN: u32 = 8;

/// Linear memory operations the allocator needs
pub trait AllocatorMemory {
    /// Grow memory by `pages` pages and return the previous size in bytes
    fn grow_pages(&mut self, pages: u32) -> Result<u32>;

    /// Copy `len` bytes from `from` to `to`
    fn copy_within(&mut self, from: u32, to: u32, len: u32) -> Result<()>;
}

/// Free-list allocator over host-grown memory regions
#[derive(Debug, Default)]
pub struct HostAllocator {
    cursor: u32,
    limit:  u32,
    live:   HashMap<u32, u32>,
    free:   Vec<(u32, u32)>,
}

fn allocation_failed(size: u32) -> Error {
    Error::resource_error(codes::ALLOCATION_FAILED, format!("cannot allocate {size} bytes"))
}

fn align_up(size: u32) -> Result<u32> {
    size.max(1)
        .checked_add(ALIGN - 1)
        .map(|s| s & !(ALIGN - 1))
        .ok_or_else(|| allocation_failed(size))
}

impl HostAllocator {
    /// Allocate `size` bytes, growing memory when no free block fits
    pub fn alloc(&mut self, size: u32, memory: &mut dyn AllocatorMemory) -> Result<u32> {
        let size = align_up(size)?;

        let best_fit = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, (_, block))| *block >= size)
            .min_by_key(|(_, (_, block))| *block)
            .map(|(index, _)| index);
        if let Some(index) = best_fit {
            let (ptr, block) = self.free.swap_remove(index);
            self.live.insert(ptr, block);
            return Ok(ptr);
        }

        if self.limit - self.cursor < size {
            // Slack so a region starting at address 0 can skip the null pointer.
            let needed = size.checked_add(ALIGN).ok_or_else(|| allocation_failed(size))?;
            let pages = needed.div_ceil(PAGE_SIZE);
            let base = memory.grow_pages(pages)?;
            // The region must end inside the 32-bit address space.
            let limit = pages
                .checked_mul(PAGE_SIZE)
                .and_then(|bytes| base.checked_add(bytes))
                .ok_or_else(|| allocation_failed(size))?;
            if base != self.limit || self.limit == 0 {
                self.cursor = base.max(ALIGN);
            }
            self.limit = limit;
        }

        let ptr = self.cursor;
        self.cursor = ptr
            .checked_add(size)
            .filter(|&end| end <= self.limit)
            .ok_or_else(|| allocation_failed(size))?;
        self.live.insert(ptr, size);
        Ok(ptr)
    }

    /// Resize the block at `ptr`, copying `min(old, new)` bytes when it moves
    pub fn realloc(&mut self, ptr: u32, size: u32, memory: &mut dyn AllocatorMemory) -> Result<u32> {
        if ptr == 0 {
            return self.alloc(size, memory);
        }
        let old = self.block_size(ptr)?;
        if align_up(size)? <= old {
            return Ok(ptr);
        }
        let new_ptr = self.alloc(size, memory)?;
        memory.copy_within(ptr, new_ptr, old.min(size))?;
        self.free(ptr)?;
        Ok(new_ptr)
    }

    /// Release the block at `ptr`. Freeing address 0 is a no-op.
    pub fn free(&mut self, ptr: u32) -> Result<()> {
        if ptr == 0 {
            return Ok(());
        }
        let size = self.block_size(ptr)?;
        self.live.remove(&ptr);
        self.free.push((ptr, size));
        Ok(())
    }

    /// Bytes currently handed out
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        self.live.values().map(|&size| u64::from(size)).sum()
    }

    fn block_size(&self, ptr: u32) -> Result<u32> {
        self.live
            .get(&ptr)
            .copied()
            .ok_or_else(|| Error::invalid_argument(format!("pointer {ptr} was not allocated by the host")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecMemory {
        bytes:     Vec<u8>,
        max_pages: u32,
    }

    impl VecMemory {
        fn new(pages: u32, max_pages: u32) -> Self {
            Self { bytes: vec![0; (pages * PAGE_SIZE) as usize], max_pages }
        }
    }

    impl AllocatorMemory for VecMemory {
        fn grow_pages(&mut self, pages: u32) -> Result<u32> {
            let old = self.bytes.len() as u32;
            if old / PAGE_SIZE + pages > self.max_pages {
                return Err(Error::resource_error(codes::RESOURCE_LIMIT_EXCEEDED, "memory limit"));
            }
            self.bytes.resize((old + pages * PAGE_SIZE) as usize, 0);
            Ok(old)
        }

        fn copy_within(&mut self, from: u32, to: u32, len: u32) -> Result<()> {
            let from = from as usize;
            self.bytes.copy_within(from..from + len as usize, to as usize);
            Ok(())
        }
    }

    /// Reports growth without backing storage, for address-space edge cases
    struct SparseMemory {
        pages: u32,
    }

    impl AllocatorMemory for SparseMemory {
        fn grow_pages(&mut self, pages: u32) -> Result<u32> {
            let old = self.pages * PAGE_SIZE;
            self.pages += pages;
            Ok(old)
        }

        fn copy_within(&mut self, _from: u32, _to: u32, _len: u32) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_growth_past_the_address_space_is_an_allocation_failure() {
        let mut memory = SparseMemory { pages: 65535 };
        let mut allocator = HostAllocator::default();
        let err = allocator.alloc(16, &mut memory).unwrap_err();
        assert!(err.is_resource_error());
        assert_eq!(err.code, codes::ALLOCATION_FAILED);

        let err = allocator.alloc(u32::MAX - 16, &mut SparseMemory { pages: 0 }).unwrap_err();
        assert_eq!(err.code, codes::ALLOCATION_FAILED);
        assert_eq!(allocator.allocated_bytes(), 0);
    }

    #[test]
    fn test_blocks_are_aligned_and_in_grown_region() {
        let mut memory = VecMemory::new(1, 4);
        let mut allocator = HostAllocator::default();
        let a = allocator.alloc(3, &mut memory).unwrap();
        let b = allocator.alloc(9, &mut memory).unwrap();
        assert_eq!(a, PAGE_SIZE);
        assert_eq!(b, PAGE_SIZE + 8);
        assert_eq!(b % ALIGN, 0);
        assert_eq!(memory.bytes.len(), 2 * PAGE_SIZE as usize);
        assert_eq!(allocator.allocated_bytes(), 24);
    }

    #[test]
    fn test_freed_blocks_are_reused_for_smaller_requests() {
        let mut memory = VecMemory::new(0, 4);
        let mut allocator = HostAllocator::default();
        let a = allocator.alloc(64, &mut memory).unwrap();
        assert_ne!(a, 0);
        allocator.free(a).unwrap();
        assert_eq!(allocator.alloc(32, &mut memory).unwrap(), a);
        let c = allocator.alloc(128, &mut memory).unwrap();
        assert_ne!(c, a);
    }

    #[test]
    fn test_realloc_moves_and_copies() {
        let mut memory = VecMemory::new(1, 4);
        let mut allocator = HostAllocator::default();
        let a = allocator.alloc(8, &mut memory).unwrap();
        memory.bytes[a as usize..a as usize + 8].copy_from_slice(b"emlite!!");

        assert_eq!(allocator.realloc(a, 4, &mut memory).unwrap(), a);
        let b = allocator.realloc(a, 100, &mut memory).unwrap();
        assert_ne!(a, b);
        assert_eq!(&memory.bytes[b as usize..b as usize + 8], b"emlite!!");
        assert_eq!(allocator.alloc(8, &mut memory).unwrap(), a);
    }

    #[test]
    fn test_growth_limit_is_a_resource_error() {
        let mut memory = VecMemory::new(1, 2);
        let mut allocator = HostAllocator::default();
        allocator.alloc(1000, &mut memory).unwrap();
        let err = allocator.alloc(2 * PAGE_SIZE, &mut memory).unwrap_err();
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_unknown_pointers_are_rejected() {
        let mut allocator = HostAllocator::default();
        assert!(allocator.free(0).is_ok());
        assert_eq!(allocator.free(1234).unwrap_err().code, codes::INVALID_ARGUMENT);
    }
}
