//! Allocation front end for views and buffers

use std::sync::Arc;

use super::{
    config::MemoryConfig,
    regions::{Block, MappedRegion},
};
use crate::{
    allocators::{Allocator, AllocatorExt, HeapAllocator},
    buffer::{CustomBuffer, Element, PointerBuffer, PointerElement, StructBuffer},
    checks::CheckMode,
    error::{Result, StructMemError},
    pointer::{Container, Pointer},
    view::Struct,
};

/// Creates views and buffers with one allocator and one check mode
///
/// Views from `malloc`/`calloc` and buffers from `malloc_buffer`/
/// `calloc_buffer` own a raw block that must be released with
/// [`MemoryManager::free`]. The `owned_*` and `mapped_*` constructors instead
/// attach a container, so memory lives until the last derived view drops.
#[derive(Debug, Clone)]
pub struct MemoryManager {
    allocator: Arc<dyn Allocator>,
    config: MemoryConfig,
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryManager {
    /// Heap-backed manager using the process-wide check mode
    pub fn new() -> Self {
        Self {
            allocator: Arc::new(HeapAllocator::new()),
            config: MemoryConfig::from_env(),
        }
    }

    pub fn with_config(config: MemoryConfig) -> Result<Self> {
        Self::with_allocator(Arc::new(HeapAllocator::new()), config)
    }

    pub fn with_allocator(allocator: Arc<dyn Allocator>, config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { allocator, config })
    }

    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.allocator
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn check_mode(&self) -> CheckMode {
        self.config.check_mode
    }

    fn alignment_for(&self, alignment: usize) -> usize {
        alignment.max(self.config.default_alignment)
    }

    fn allocate<E: Element>(&self, count: usize, alignment: usize, zeroed: bool) -> Result<usize> {
        let ptr = self
            .allocator
            .allocate_array(count, E::sizeof(), self.alignment_for(alignment), zeroed)?;
        Ok(ptr.as_ptr() as usize)
    }

    fn block_size<S: Struct>(capacity: usize) -> Result<usize> {
        capacity.checked_mul(S::sizeof()).ok_or_else(|| {
            StructMemError::invalid_argument("capacity", "buffer size overflows")
        })
    }

    /// Uninitialized struct
    pub fn malloc<S: Struct>(&self) -> Result<S> {
        let address = self.allocate::<S>(1, S::alignof(), false)?;
        unsafe { S::create(address, None, self.check_mode()) }
    }

    /// Zeroed struct
    pub fn calloc<S: Struct>(&self) -> Result<S> {
        let address = self.allocate::<S>(1, S::alignof(), true)?;
        unsafe { S::create(address, None, self.check_mode()) }
    }

    /// Uninitialized buffer of `capacity` structs
    pub fn malloc_buffer<S: Struct>(&self, capacity: usize) -> Result<StructBuffer<S>> {
        let address = self.allocate::<S>(capacity, S::alignof(), false)?;
        unsafe { CustomBuffer::create(address, capacity, None, self.check_mode()) }
    }

    /// Zeroed buffer of `capacity` structs
    pub fn calloc_buffer<S: Struct>(&self, capacity: usize) -> Result<StructBuffer<S>> {
        let address = self.allocate::<S>(capacity, S::alignof(), true)?;
        unsafe { CustomBuffer::create(address, capacity, None, self.check_mode()) }
    }

    /// Zeroed buffer of `capacity` pointers
    pub fn pointer_buffer(&self, capacity: usize) -> Result<PointerBuffer> {
        let address =
            self.allocate::<PointerElement>(capacity, PointerElement::sizeof(), true)?;
        unsafe { CustomBuffer::create(address, capacity, None, self.check_mode()) }
    }

    /// Zeroed buffer whose memory is released when the last view drops
    pub fn owned_buffer<S: Struct>(&self, capacity: usize) -> Result<StructBuffer<S>> {
        let size = Self::block_size::<S>(capacity)?;
        let block = Arc::new(Block::new(
            self.allocator.clone(),
            size,
            self.alignment_for(S::alignof()),
            true,
        )?);
        let address = block.address();
        unsafe { self.buffer_in(block, address, capacity) }
    }

    /// Zeroed buffer over an anonymous mapping
    pub fn mapped_buffer<S: Struct>(&self, capacity: usize) -> Result<StructBuffer<S>> {
        let size = Self::block_size::<S>(capacity)?;
        let region = Arc::new(MappedRegion::new(size.max(1))?);
        let address = region.address();
        unsafe { self.buffer_in(region, address, capacity) }
    }

    /// View over foreign memory
    ///
    /// # Safety
    /// `address` must be valid for `S::sizeof()` bytes while the view is used.
    pub unsafe fn view<S: Struct>(&self, address: usize) -> Result<S> {
        S::create(address, None, self.check_mode())
    }

    /// Buffer over foreign memory
    ///
    /// # Safety
    /// `address` must be valid for `capacity * E::sizeof()` bytes while the
    /// buffer or anything derived from it is used.
    pub unsafe fn buffer<E: Element>(&self, address: usize, capacity: usize) -> Result<CustomBuffer<E>> {
        CustomBuffer::create(address, capacity, None, self.check_mode())
    }

    /// Buffer over memory owned by `container`
    ///
    /// # Safety
    /// `address` must point into `container`'s storage with room for
    /// `capacity * E::sizeof()` bytes.
    pub unsafe fn buffer_in<E: Element>(
        &self,
        container: Container,
        address: usize,
        capacity: usize,
    ) -> Result<CustomBuffer<E>> {
        CustomBuffer::create(address, capacity, Some(container), self.check_mode())
    }

    /// Release a view or buffer obtained from an allocating constructor
    ///
    /// Over a [`StackAllocator`](crate::allocators::StackAllocator) this
    /// returns `Ok` without reclaiming anything; the block is released when
    /// its frame drops.
    ///
    /// # Safety
    /// `pointer` must come from `malloc`, `calloc`, `malloc_buffer`,
    /// `calloc_buffer` or `pointer_buffer` of this manager and not have been
    /// freed yet. No clone, slice, duplicate or element view sharing its
    /// memory may be used afterwards.
    pub unsafe fn free<P: Pointer>(&self, pointer: P) -> Result<()> {
        log::trace!("freeing {} at {:#x}", pointer.kind(), pointer.base_address());
        self.allocator.deallocate_address(pointer.base_address())
    }
}
