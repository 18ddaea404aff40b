//! Allocator trait definition

use std::ptr::NonNull;

use crate::error::{Result, StructMemError};

/// Host allocator used for the allocating constructors and `free()`
///
/// Blocks are released by base address alone, like C `free`.
pub trait Allocator: Send + Sync + std::fmt::Debug {
    /// Allocate `size` bytes aligned to `align`
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>>;

    /// Release a block previously returned by `allocate`
    fn deallocate(&self, ptr: NonNull<u8>) -> Result<()>;

    /// Bytes currently handed out
    fn used_size(&self) -> usize;

    /// Check if a pointer was allocated by this allocator
    fn owns(&self, ptr: NonNull<u8>) -> bool;

    /// Get allocator type name for debugging
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Common allocator operations
pub trait AllocatorExt: Allocator {
    /// Allocate and zero-initialize memory
    fn allocate_zeroed(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        let ptr = self.allocate(size, align)?;
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
        }
        Ok(ptr)
    }

    /// Allocate room for `count` elements of `stride` bytes
    fn allocate_array(&self, count: usize, stride: usize, align: usize, zeroed: bool) -> Result<NonNull<u8>> {
        let size = count.checked_mul(stride).ok_or_else(|| {
            StructMemError::invalid_argument("count", format!("{} x {} bytes overflows", count, stride))
        })?;
        if zeroed {
            self.allocate_zeroed(size, align)
        } else {
            self.allocate(size, align)
        }
    }

    /// Release the block at a raw address
    fn deallocate_address(&self, address: usize) -> Result<()> {
        let ptr = NonNull::new(address as *mut u8)
            .ok_or_else(|| StructMemError::invalid_argument("address", "cannot free the null address"))?;
        self.deallocate(ptr)
    }
}

// Blanket implementation for all Allocators
impl<T: Allocator + ?Sized> AllocatorExt for T {}

pub(crate) fn check_alignment(align: usize) -> Result<()> {
    if !align.is_power_of_two() {
        return Err(StructMemError::invalid_argument(
            "align",
            "Alignment must be a power of 2",
        ));
    }
    Ok(())
}
