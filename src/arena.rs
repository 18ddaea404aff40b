//! Arena of generation-tagged blocks
//!
//! Instead of bare addresses, callers hold [`Handle`]s. Freeing a block bumps
//! its slot generation, so a handle that outlived its block is reported as
//! [`StructMemError::StaleHandle`]. Views and buffers are lent to closures and
//! carry the block as their container: one that escapes the closure and
//! outlives `free` keeps the memory alive instead of dangling, and the block
//! returns to the allocator when the last such view drops.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crate::{
    allocators::{Allocator, HeapAllocator},
    buffer::{CustomBuffer, Element},
    checks::{check_argument, check_index, CheckMode},
    error::{Result, StructMemError},
    memory::Block,
    pointer::Container,
    view::{RawStruct, Struct},
};

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Generation-tagged reference to an arena block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    arena: u32,
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn arena(&self) -> u32 {
        self.arena
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot {
    block: Option<Arc<Block>>,
    generation: u32,
}

/// Owner of a set of blocks addressed through [`Handle`]s
#[derive(Debug)]
pub struct Arena {
    id: u32,
    allocator: Arc<dyn Allocator>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    mode: CheckMode,
}

impl Arena {
    pub fn new(allocator: Arc<dyn Allocator>, mode: CheckMode) -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            allocator,
            slots: Vec::new(),
            free_slots: Vec::new(),
            mode,
        }
    }

    /// Heap-backed arena
    pub fn with_heap(mode: CheckMode) -> Self {
        Self::new(Arc::new(HeapAllocator::new()), mode)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of live blocks
    pub fn live(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Allocate a zeroed block
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<Handle> {
        let block = Arc::new(Block::new(self.allocator.clone(), size, align, true)?);

        let index = match self.free_slots.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.block = Some(block);
                log::trace!("arena {}: reusing slot {} at generation {}", self.id, index, slot.generation);
                index
            }
            None => {
                self.slots.push(Slot {
                    block: Some(block),
                    generation: 0,
                });
                (self.slots.len() - 1) as u32
            }
        };

        Ok(Handle {
            arena: self.id,
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Allocate a zeroed block for `capacity` elements of `E`
    pub fn alloc_elements<E: Element>(&mut self, capacity: usize, align: usize) -> Result<Handle> {
        let size = capacity.checked_mul(E::sizeof()).ok_or_else(|| {
            StructMemError::invalid_argument("capacity", "element block size overflows")
        })?;
        self.alloc(size, align)
    }

    fn block(&self, handle: Handle) -> Result<&Arc<Block>> {
        if handle.arena != self.id {
            return Err(StructMemError::invalid_argument(
                "handle",
                format!("handle of arena {} used with arena {}", handle.arena, self.id),
            ));
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.block.as_ref())
            .ok_or_else(|| StructMemError::stale_handle(handle.arena, handle.index, handle.generation))
    }

    /// Current address of a live block
    pub fn resolve(&self, handle: Handle) -> Result<usize> {
        self.block(handle).map(|block| block.address())
    }

    /// Size of a live block
    pub fn size_of(&self, handle: Handle) -> Result<usize> {
        self.block(handle).map(|block| block.size())
    }

    /// Release a block; the handle and any copy of it become stale
    ///
    /// Views lent earlier that are still alive keep the memory until they drop.
    pub fn free(&mut self, handle: Handle) -> Result<()> {
        self.block(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let block = slot.block.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);

        if let Some(block) = block {
            if Arc::strong_count(&block) > 1 {
                log::debug!(
                    "arena {}: slot {} freed while {} views remain",
                    self.id,
                    handle.index,
                    Arc::strong_count(&block) - 1
                );
            }
        }
        Ok(())
    }

    /// Lend the struct at element `index` of a block to `f`
    pub fn with_view<S: Struct, R>(&self, handle: Handle, index: usize, f: impl FnOnce(&S) -> R) -> Result<R> {
        let block = self.block(handle)?;
        check_index(self.mode, index, block.size() / S::sizeof().max(1))?;

        let view = S::from_raw(RawStruct::materialize(
            block.address() + index * S::sizeof(),
            Some(block.clone() as Container),
            self.mode,
        ));
        Ok(f(&view))
    }

    /// Lend a buffer spanning a whole block to `f`
    pub fn with_buffer<E: Element, R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut CustomBuffer<E>) -> R,
    ) -> Result<R> {
        let block = self.block(handle)?;
        check_argument(self.mode, E::sizeof() > 0, "element", "zero-sized element kind")?;

        let mut buffer = unsafe {
            CustomBuffer::create(
                block.address(),
                block.size() / E::sizeof(),
                Some(block.clone() as Container),
                self.mode,
            )?
        };
        Ok(f(&mut buffer))
    }
}
