//! Stack allocator - bump allocation with frame-scoped release
//!
//! Meant for short-lived structs: push a frame, allocate a few views, and the
//! whole frame is reclaimed when the [`StackFrame`] guard drops.

use std::{
    alloc::{self, Layout},
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::traits::{check_alignment, Allocator};
use crate::error::{Result, StructMemError};

/// Alignment of the memory a stack allocator owns
const STACK_ALIGNMENT: usize = 64;

/// Bump allocator over a fixed memory region
///
/// Individual blocks cannot be released: `deallocate` is a no-op that reports
/// success, so freeing a view or buffer allocated here returns `Ok` without
/// reclaiming anything. Memory comes back only when a [`StackFrame`] drops,
/// and nothing ties the views allocated inside a frame to the guard's
/// lifetime; a view used after its frame dropped aliases whatever is
/// allocated next.
#[derive(Debug)]
pub struct StackAllocator {
    /// Base pointer to the memory region
    base_ptr: NonNull<u8>,
    /// Total size of the region
    total_size: usize,
    /// Current offset (atomically updated)
    current_offset: AtomicUsize,
    /// Whether the region was allocated by this stack
    owned: bool,
}

impl StackAllocator {
    /// Create a stack owning `size` bytes of heap memory
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(StructMemError::invalid_argument(
                "size",
                "Stack size must be greater than 0",
            ));
        }

        let layout = Layout::from_size_align(size, STACK_ALIGNMENT)
            .map_err(|e| StructMemError::memory(format!("invalid stack layout: {}", e)))?;
        let base_ptr = NonNull::new(unsafe { alloc::alloc(layout) })
            .ok_or_else(|| StructMemError::memory("stack allocation failed"))?;

        Ok(Self {
            base_ptr,
            total_size: size,
            current_offset: AtomicUsize::new(0),
            owned: true,
        })
    }

    /// Create from raw pointer and size
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes for `size` bytes
    /// - The memory region must remain valid for the lifetime of the allocator
    pub unsafe fn from_raw(ptr: *mut u8, size: usize) -> Result<Self> {
        let base_ptr = NonNull::new(ptr).ok_or_else(|| {
            StructMemError::invalid_argument("ptr", "Invalid pointer")
        })?;
        if size == 0 {
            return Err(StructMemError::invalid_argument("size", "Invalid size"));
        }

        Ok(Self {
            base_ptr,
            total_size: size,
            current_offset: AtomicUsize::new(0),
            owned: false,
        })
    }

    /// Get current position in the allocation region
    pub fn pointer(&self) -> usize {
        self.current_offset.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.total_size
    }

    /// Open a frame; everything allocated until the guard drops is reclaimed
    pub fn frame(&self) -> StackFrame<'_> {
        StackFrame {
            stack: self,
            saved: self.pointer(),
        }
    }

    /// `None` when rounding up overflows
    fn align_up(value: usize, align: usize) -> Option<usize> {
        value.checked_add(align - 1).map(|v| v & !(align - 1))
    }

    /// Aligned address and stack offset after bumping `size` bytes past `current`
    fn bump(&self, current: usize, size: usize, align: usize) -> Result<(usize, usize)> {
        let base_addr = self.base_ptr.as_ptr() as usize;
        let bumped = base_addr
            .checked_add(current)
            .and_then(|addr| Self::align_up(addr, align))
            .and_then(|aligned| Some((aligned, (aligned - base_addr).checked_add(size)?)))
            .filter(|&(_, end)| end <= self.total_size);

        bumped.ok_or_else(|| {
            StructMemError::memory(format!(
                "stack overflow: requested {}, available {}",
                size,
                self.total_size - current
            ))
        })
    }
}

impl Allocator for StackAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        check_alignment(align)?;

        loop {
            let current = self.current_offset.load(Ordering::Acquire);
            let (aligned_addr, new_offset) = self.bump(current, size, align)?;

            match self.current_offset.compare_exchange_weak(
                current,
                new_offset,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return NonNull::new(aligned_addr as *mut u8)
                        .ok_or_else(|| StructMemError::memory("Failed to create pointer"));
                }
                Err(_) => std::hint::spin_loop(),
            }
        }
    }

    fn deallocate(&self, _ptr: NonNull<u8>) -> Result<()> {
        // No-op: reclaimed when the enclosing frame pops
        Ok(())
    }

    fn used_size(&self) -> usize {
        self.pointer()
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        let ptr_addr = ptr.as_ptr() as usize;
        let base_addr = self.base_ptr.as_ptr() as usize;
        ptr_addr >= base_addr && ptr_addr < base_addr + self.total_size
    }
}

impl Drop for StackAllocator {
    fn drop(&mut self) {
        if self.owned {
            if let Ok(layout) = Layout::from_size_align(self.total_size, STACK_ALIGNMENT) {
                unsafe { alloc::dealloc(self.base_ptr.as_ptr(), layout) };
            }
        }
    }
}

unsafe impl Send for StackAllocator {}
unsafe impl Sync for StackAllocator {}

/// Scope guard restoring the stack pointer on drop
#[derive(Debug)]
pub struct StackFrame<'a> {
    stack: &'a StackAllocator,
    saved: usize,
}

impl StackFrame<'_> {
    pub fn stack(&self) -> &StackAllocator {
        self.stack
    }
}

impl Drop for StackFrame<'_> {
    fn drop(&mut self) {
        self.stack.current_offset.store(self.saved, Ordering::Release);
    }
}
