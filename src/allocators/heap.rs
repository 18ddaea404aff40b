//! System heap allocator with free-by-address bookkeeping

use std::{
    alloc::{self, Layout},
    collections::HashMap,
    ptr::NonNull,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use super::traits::{check_alignment, Allocator};
use crate::error::{Result, StructMemError};

/// Allocator over the global system heap
///
/// Remembers the layout of every live block so `deallocate` only needs the
/// base address.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    blocks: Mutex<HashMap<usize, Layout>>,
    used: AtomicUsize,
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blocks
    pub fn live_blocks(&self) -> usize {
        self.blocks.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<usize, Layout>>> {
        self.blocks
            .lock()
            .map_err(|_| StructMemError::memory("heap allocator bookkeeping poisoned"))
    }
}

impl Allocator for HeapAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        check_alignment(align)?;

        // Zero-sized requests still get a unique address
        let layout = Layout::from_size_align(size.max(1), align)
            .map_err(|e| StructMemError::memory(format!("invalid layout: {}", e)))?;

        let ptr = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or_else(|| {
            StructMemError::memory(format!("allocation of {} bytes failed", layout.size()))
        })?;

        self.lock()?.insert(ptr.as_ptr() as usize, layout);
        self.used.fetch_add(layout.size(), Ordering::Relaxed);
        log::trace!("heap: allocated {} bytes at {:#x}", layout.size(), ptr.as_ptr() as usize);
        Ok(ptr)
    }

    fn deallocate(&self, ptr: NonNull<u8>) -> Result<()> {
        let address = ptr.as_ptr() as usize;
        let layout = self.lock()?.remove(&address).ok_or_else(|| {
            StructMemError::memory(format!("{:#x} is not a live heap block", address))
        })?;

        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        self.used.fetch_sub(layout.size(), Ordering::Relaxed);
        log::trace!("heap: freed {} bytes at {:#x}", layout.size(), address);
        Ok(())
    }

    fn used_size(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.blocks
            .lock()
            .map(|b| b.contains_key(&(ptr.as_ptr() as usize)))
            .unwrap_or(false)
    }
}

impl Drop for HeapAllocator {
    fn drop(&mut self) {
        let blocks = match self.blocks.get_mut() {
            Ok(blocks) => blocks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !blocks.is_empty() {
            log::debug!("heap: releasing {} leaked blocks", blocks.len());
        }
        for (address, layout) in blocks.drain() {
            unsafe { alloc::dealloc(address as *mut u8, layout) };
        }
    }
}
