//! Backing allocations usable as view containers
//!
//! Both types free their memory on drop. Handing one to a buffer as its
//! [`Container`](crate::pointer::Container) keeps the memory alive for as long
//! as any view or slice derived from that buffer exists.

use std::{ptr::NonNull, sync::Arc};

use memmap2::{MmapMut, MmapOptions};

use crate::{
    allocators::{Allocator, AllocatorExt},
    error::{Result, StructMemError},
};

/// Block allocated from a host allocator and released on drop
#[derive(Debug)]
pub struct Block {
    ptr: NonNull<u8>,
    size: usize,
    allocator: Arc<dyn Allocator>,
}

impl Block {
    pub fn new(allocator: Arc<dyn Allocator>, size: usize, align: usize, zeroed: bool) -> Result<Self> {
        let ptr = if zeroed {
            allocator.allocate_zeroed(size, align)?
        } else {
            allocator.allocate(size, align)?
        };
        log::debug!("block: {} bytes at {:#x}", size, ptr.as_ptr() as usize);
        Ok(Self {
            ptr,
            size,
            allocator,
        })
    }

    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if let Err(e) = self.allocator.deallocate(self.ptr) {
            log::warn!("block: failed to release {:#x}: {}", self.address(), e);
        }
    }
}

// The block is plain bytes; synchronizing access is up to the views.
unsafe impl Send for Block {}
unsafe impl Sync for Block {}

/// Anonymous memory mapping
#[derive(Debug)]
pub struct MappedRegion {
    mmap: MmapMut,
}

impl MappedRegion {
    /// Map `size` zeroed bytes
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(StructMemError::invalid_argument(
                "size",
                "Mapped region size cannot be zero",
            ));
        }
        let mmap = MmapOptions::new()
            .len(size)
            .map_anon()
            .map_err(|e| StructMemError::memory(format!("anonymous mapping failed: {}", e)))?;
        log::debug!("mapped {} bytes at {:#x}", size, mmap.as_ptr() as usize);
        Ok(Self { mmap })
    }

    pub fn address(&self) -> usize {
        self.mmap.as_ptr() as usize
    }

    pub fn size(&self) -> usize {
        self.mmap.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::HeapAllocator;

    #[test]
    fn test_block_released_on_drop() {
        let heap = Arc::new(HeapAllocator::new());
        let block = Block::new(heap.clone(), 64, 16, true).unwrap();
        assert_eq!(block.address() % 16, 0);
        assert_eq!(heap.used_size(), 64);

        drop(block);
        assert_eq!(heap.used_size(), 0);
    }

    #[test]
    fn test_mapped_region() {
        let region = MappedRegion::new(4096).unwrap();
        assert_eq!(region.size(), 4096);
        assert!(region.as_slice().iter().all(|&b| b == 0));
        assert!(MappedRegion::new(0).is_err());
    }
}
